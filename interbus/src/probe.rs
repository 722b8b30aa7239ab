//! Device-type probing with a bounded busy retry.
//!
//! Discovery is the only place the crate tolerates a busy bus. Another
//! application holding the driver, or a module still booting, answers busy
//! for a short while; probing waits it out a fixed number of times and then
//! reports the address as empty.

use std::sync::Arc;
use std::time::Duration;

use crate::{
    codec::{self, TypedValue, WireType},
    result::{translate, CommResult},
    register::common::DEVICE_TYPE_REGISTER,
    tracing::prelude::*,
    transport::{Port, Transport},
};

/// Knobs for discovery traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Extra attempts after a busy answer.
    pub busy_retries: u32,
    /// Fixed delay between attempts.
    pub busy_backoff: Duration,
    /// Let the driver enumerate modules on open.
    pub auto_mode: bool,
    /// Keep the driver polling registers while ports are open.
    pub live_mode: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            busy_retries: 3,
            busy_backoff: Duration::from_millis(50),
            auto_mode: true,
            live_mode: true,
        }
    }
}

impl DiscoveryConfig {
    /// Defaults, with `INTERBUS_BUSY_RETRIES` overriding the retry bound.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub(crate) fn with_env_overrides(mut self) -> Self {
        if let Some(retries) = std::env::var("INTERBUS_BUSY_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
        {
            self.busy_retries = retries;
        }
        self
    }
}

/// Device-type bytes for every address on one port, indexed by address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTable(Vec<u8>);

impl DeviceTable {
    pub fn new(types: Vec<u8>) -> Self {
        Self(types)
    }

    /// Type at `address`. Addresses past the end of the table and empty
    /// slots both read as absent.
    pub fn type_at(&self, address: u8) -> Option<u8> {
        self.0
            .get(usize::from(address))
            .copied()
            .filter(|&t| t != 0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Reads device types off the bus.
pub struct ModuleProbe<T: ?Sized> {
    transport: Arc<T>,
    config: DiscoveryConfig,
}

impl<T: Transport + ?Sized> ModuleProbe<T> {
    pub fn new(transport: Arc<T>, config: DiscoveryConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Device type at `port`:`address`, or `None` if nothing usable
    /// answered.
    pub async fn probe(&self, port: &Port, address: u8) -> Option<u8> {
        let mut attempt = 0;
        loop {
            let (code, bytes) = self
                .transport
                .read_register(port, address, DEVICE_TYPE_REGISTER, None)
                .await;

            match translate(code) {
                CommResult::Success => {
                    return match codec::decode(WireType::U8, &bytes, None) {
                        Ok(TypedValue::U8(device_type)) => {
                            trace!(port = %port, address, device_type = %format!("0x{device_type:02X}"), "Probed");
                            Some(device_type)
                        }
                        _ => {
                            debug!(port = %port, address, bytes = %hex::encode(&bytes), "Unreadable device type");
                            None
                        }
                    };
                }
                CommResult::DeviceBusy if attempt < self.config.busy_retries => {
                    attempt += 1;
                    debug!(port = %port, address, attempt, "Bus busy, retrying probe");
                    tokio::time::sleep(self.config.busy_backoff).await;
                }
                outcome => {
                    trace!(port = %port, address, ?outcome, "No module");
                    return None;
                }
            }
        }
    }

    /// Snapshot of the device-type table for `port`, under the same busy
    /// policy as [`probe`](Self::probe).
    pub async fn device_types(&self, port: &Port) -> Option<DeviceTable> {
        let mut attempt = 0;
        loop {
            let (code, types) = self.transport.device_type_table(port).await;

            match translate(code) {
                CommResult::Success => {
                    trace!(port = %port, table = %hex::encode(&types), "Device-type table");
                    return Some(DeviceTable::new(types));
                }
                CommResult::DeviceBusy if attempt < self.config.busy_retries => {
                    attempt += 1;
                    debug!(port = %port, attempt, "Bus busy, retrying device-type table");
                    tokio::time::sleep(self.config.busy_backoff).await;
                }
                outcome => {
                    debug!(port = %port, ?outcome, "Device-type table unavailable");
                    return None;
                }
            }
        }
    }
}
