//! Module kinds known to this crate.
//!
//! Each kind is a [`TargetSignature`](crate::discovery::TargetSignature), a
//! set of register descriptors and the bit tables for its status and setup
//! registers. Nothing here talks to the bus; callers pass these to
//! [`Bus`](crate::bus::Bus) and [`RegisterAccess`](crate::access::RegisterAccess).

use crate::discovery::TargetSignature;
use crate::register::RegisterDescriptor;

pub mod basik;
pub mod extreme;
pub mod rf_driver;
pub mod select;
pub mod varia;

/// A module kind and its status register.
#[derive(Debug, Clone, Copy)]
pub struct DeviceKind {
    pub signature: &'static TargetSignature,
    pub status: &'static RegisterDescriptor,
}

/// Every known kind, in the order the scan binary reports them.
pub const ALL: [DeviceKind; 5] = [
    DeviceKind {
        signature: &extreme::SIGNATURE,
        status: &extreme::STATUS,
    },
    DeviceKind {
        signature: &select::SIGNATURE,
        status: &select::STATUS,
    },
    DeviceKind {
        signature: &rf_driver::SIGNATURE,
        status: &rf_driver::STATUS,
    },
    DeviceKind {
        signature: &varia::SIGNATURE,
        status: &varia::STATUS,
    },
    DeviceKind {
        signature: &basik::SIGNATURE,
        status: &basik::STATUS,
    },
];

/// Look a kind up by its name, ignoring case.
pub fn by_name(name: &str) -> Option<DeviceKind> {
    ALL.into_iter()
        .find(|kind| kind.signature.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_types_are_distinct() {
        let mut seen = Vec::new();
        for kind in ALL {
            for t in kind.signature.device_types {
                assert!(!seen.contains(t), "0x{t:02X} claimed twice");
                seen.push(*t);
            }
        }
    }

    #[test]
    fn every_signature_names_a_device_type() {
        for kind in ALL {
            assert!(!kind.signature.device_types.is_empty(), "{}", kind.signature.name);
            assert!(!kind.signature.device_types.contains(&0), "{}", kind.signature.name);
            assert!(kind.signature.addresses.iter().next().is_some(), "{}", kind.signature.name);
        }
    }

    #[test]
    fn every_status_register_has_a_table() {
        for kind in ALL {
            assert!(kind.status.flags.is_some(), "{}", kind.signature.name);
        }
    }

    #[test]
    fn lookup_by_name() {
        let kind = by_name("superk select").unwrap();
        assert_eq!(kind.signature, &select::SIGNATURE);
        assert_eq!(kind.status.register, 0x66);
        assert!(by_name("nonexistent").is_none());
    }
}
