//! Entry point tying discovery, resolution and register access together.

use std::sync::Arc;

use crate::{
    access::RegisterAccess,
    discovery::{DeviceDiscovery, TargetSignature},
    error::{DiscoveryError, Result},
    probe::{DiscoveryConfig, ModuleProbe},
    register::ModuleBinding,
    resolver,
    tracing::prelude::*,
    transport::{Port, Transport},
};

/// One driver's view of the bus.
pub struct Bus<T: ?Sized> {
    transport: Arc<T>,
    discovery: DeviceDiscovery<T>,
    probe: ModuleProbe<T>,
}

impl<T: Transport + ?Sized + 'static> Bus<T> {
    pub fn new(transport: Arc<T>, config: DiscoveryConfig) -> Self {
        Self {
            discovery: DeviceDiscovery::new(transport.clone(), config.clone()),
            probe: ModuleProbe::new(transport.clone(), config),
            transport,
        }
    }

    /// Find the single module matching `signature`.
    pub async fn discover(&self, signature: &TargetSignature) -> Result<ModuleBinding> {
        let candidates = self.discovery.scan(signature).await?;
        Ok(resolver::resolve(signature, candidates)?)
    }

    /// Bind to a known location without touching the bus.
    ///
    /// The binding carries the signature's first device type; nothing checks
    /// that the module really is there.
    pub fn bind(&self, port: Port, address: u8, signature: &TargetSignature) -> ModuleBinding {
        let device_type = signature.device_types.first().copied().unwrap_or_else(|| {
            warn!(kind = signature.name, "Signature lists no device type, binding type 0");
            0
        });
        debug!(kind = signature.name, port = %port, address, "Trusted bind");
        ModuleBinding::new(port, address, device_type)
    }

    /// Bind to a known location after probing it once.
    pub async fn bind_verified(
        &self,
        port: Port,
        address: u8,
        signature: &TargetSignature,
    ) -> Result<ModuleBinding> {
        let Some(found) = self.probe.probe(&port, address).await else {
            return Err(DiscoveryError::NotFound {
                kind: signature.name,
            }
            .into());
        };
        if !signature.matches(found) {
            return Err(DiscoveryError::Mismatch {
                kind: signature.name,
                port,
                address,
                found,
            }
            .into());
        }

        let binding = ModuleBinding::new(port, address, found);
        info!(kind = signature.name, binding = %binding, "Verified bind");
        Ok(binding)
    }

    /// Register access for a binding.
    pub fn access(&self, binding: ModuleBinding) -> RegisterAccess<T> {
        RegisterAccess::new(self.transport.clone(), binding)
    }
}
