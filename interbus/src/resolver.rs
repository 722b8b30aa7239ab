//! Reducing scan candidates to one binding.

use crate::{
    discovery::{Candidate, TargetSignature},
    error::DiscoveryError,
    register::ModuleBinding,
    tracing::prelude::*,
};

/// Exactly one candidate becomes a binding. None is `NotFound`; several are
/// `Ambiguous`, listing every location in scan order. There is no
/// tie-break: callers that know which instance they want bind explicitly.
pub fn resolve(
    signature: &TargetSignature,
    candidates: Vec<Candidate>,
) -> Result<ModuleBinding, DiscoveryError> {
    let mut candidates = candidates.into_iter();
    match (candidates.next(), candidates.next()) {
        (None, _) => Err(DiscoveryError::NotFound {
            kind: signature.name,
        }),
        (Some(only), None) => {
            let binding = ModuleBinding::new(only.port, only.address, only.device_type);
            info!(kind = signature.name, binding = %binding, "Resolved module");
            Ok(binding)
        }
        (Some(first), Some(second)) => {
            let locations = [first, second]
                .into_iter()
                .chain(candidates)
                .map(|c| (c.port, c.address))
                .collect();
            Err(DiscoveryError::Ambiguous {
                kind: signature.name,
                locations,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::AddressRange;
    use crate::transport::Port;

    const RF: TargetSignature = TargetSignature {
        name: "RF driver",
        device_types: &[0x66],
        addresses: AddressRange::Block {
            first: 16,
            count: 9,
        },
    };

    fn candidate(port: &str, address: u8) -> Candidate {
        Candidate {
            port: port.into(),
            address,
            device_type: 0x66,
        }
    }

    #[test]
    fn none_is_not_found() {
        assert_eq!(
            resolve(&RF, vec![]),
            Err(DiscoveryError::NotFound { kind: "RF driver" })
        );
    }

    #[test]
    fn one_binds() {
        let binding = resolve(&RF, vec![candidate("COM4", 17)]).unwrap();
        assert_eq!(binding.port(), &Port::new("COM4"));
        assert_eq!(binding.address(), 17);
        assert_eq!(binding.device_type(), 0x66);
    }

    #[test]
    fn many_lists_all_in_scan_order() {
        let err = resolve(
            &RF,
            vec![candidate("COM4", 17), candidate("COM4", 20), candidate("COM9", 16)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            DiscoveryError::Ambiguous {
                kind: "RF driver",
                locations: vec![
                    (Port::new("COM4"), 17),
                    (Port::new("COM4"), 20),
                    (Port::new("COM9"), 16)
                ],
            }
        );
    }
}
