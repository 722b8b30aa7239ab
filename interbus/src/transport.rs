//! Capability interface onto the physical bus driver.
//!
//! The driver owns the serial channels and the raw byte exchange. This crate
//! consumes it through [`Transport`] and never manages port lifecycles beyond
//! the scoped session opened by discovery.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Name of one serial channel as reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Port(String);

impl Port {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Port {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Which ports a close request releases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortSelector {
    All,
    One(Port),
}

/// Result code from a register read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterCode(pub i32);

/// Result code from opening or closing ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortCode(pub i32);

/// Result code from device-level queries such as the device-type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCode(pub i32);

/// Request/response access to the bus driver.
///
/// Every call is one complete exchange. Implementations are expected to
/// surface a timeout code rather than hang. Callers serialize traffic per
/// port; implementations need not.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Enumerate candidate ports. May be empty.
    async fn list_ports(&self) -> Vec<Port>;

    /// Prepare ports for scanning. `auto_mode` lets the driver enumerate
    /// modules itself, `live_mode` keeps it polling their registers.
    async fn open(&self, ports: &[Port], auto_mode: bool, live_mode: bool) -> PortCode;

    async fn close(&self, selector: PortSelector) -> PortCode;

    /// Read a register. With `index` set, the returned bytes start at that
    /// byte offset into the register.
    async fn read_register(
        &self,
        port: &Port,
        address: u8,
        register: u8,
        index: Option<u8>,
    ) -> (RegisterCode, Vec<u8>);

    async fn write_register(
        &self,
        port: &Port,
        address: u8,
        register: u8,
        index: Option<u8>,
        bytes: &[u8],
    ) -> RegisterCode;

    /// Snapshot of the device-type byte at every address the port knows,
    /// indexed by address. Zero marks an empty slot.
    async fn device_type_table(&self, port: &Port) -> (DeviceCode, Vec<u8>);
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn list_ports(&self) -> Vec<Port> {
        (**self).list_ports().await
    }

    async fn open(&self, ports: &[Port], auto_mode: bool, live_mode: bool) -> PortCode {
        (**self).open(ports, auto_mode, live_mode).await
    }

    async fn close(&self, selector: PortSelector) -> PortCode {
        (**self).close(selector).await
    }

    async fn read_register(
        &self,
        port: &Port,
        address: u8,
        register: u8,
        index: Option<u8>,
    ) -> (RegisterCode, Vec<u8>) {
        (**self).read_register(port, address, register, index).await
    }

    async fn write_register(
        &self,
        port: &Port,
        address: u8,
        register: u8,
        index: Option<u8>,
        bytes: &[u8],
    ) -> RegisterCode {
        (**self)
            .write_register(port, address, register, index, bytes)
            .await
    }

    async fn device_type_table(&self, port: &Port) -> (DeviceCode, Vec<u8>) {
        (**self).device_type_table(port).await
    }
}
