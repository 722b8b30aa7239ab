//! Scanning ports and addresses for modules of one kind.
//!
//! A kind is described by a [`TargetSignature`]: the device-type bytes it
//! answers with and the addresses it can sit at. One scan visits every listed
//! port in transport order and every candidate address in ascending order,
//! and reports every match. Choosing among matches is the resolver's job.
//!
//! Ports are opened for the duration of one scan and closed again by the
//! same call, whether it succeeds or fails.

use std::fmt;
use std::mem;
use std::slice;
use std::sync::Arc;

use tokio::runtime::Handle;

use crate::{
    error::CommError,
    probe::{DiscoveryConfig, ModuleProbe},
    result::translate,
    tracing::prelude::*,
    transport::{Port, PortSelector, Transport},
};

/// Where modules of one kind may be addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressRange {
    /// Always this address.
    Fixed(u8),
    /// `count` consecutive addresses starting at `first`.
    Block { first: u8, count: u8 },
}

impl AddressRange {
    /// Candidate addresses in ascending order. Addresses past 255 are
    /// dropped.
    pub fn iter(&self) -> impl Iterator<Item = u8> {
        let (first, count) = match *self {
            Self::Fixed(address) => (address, 1),
            Self::Block { first, count } => (first, count),
        };
        let first = u16::from(first);
        (first..first + u16::from(count)).filter_map(|a| u8::try_from(a).ok())
    }

    pub fn contains(&self, address: u8) -> bool {
        match *self {
            Self::Fixed(a) => a == address,
            Self::Block { first, count } => {
                address >= first && u16::from(address) < u16::from(first) + u16::from(count)
            }
        }
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Fixed(a) => write!(f, "{a}"),
            Self::Block { first, count: 0 } => write!(f, "{first}..{first} (empty)"),
            Self::Block { first, count } => {
                write!(f, "{first}..={}", u16::from(first) + u16::from(count) - 1)
            }
        }
    }
}

/// What identifies a module kind on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSignature {
    /// Human-readable kind, used in errors and logs.
    pub name: &'static str,
    /// Accepted device-type bytes. Never empty; the first is the one a
    /// trusted bind records.
    pub device_types: &'static [u8],
    pub addresses: AddressRange,
}

impl TargetSignature {
    pub fn matches(&self, device_type: u8) -> bool {
        self.device_types.contains(&device_type)
    }
}

/// A module of the requested kind seen during one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub port: Port,
    pub address: u8,
    pub device_type: u8,
}

/// Ports opened by one scan. Closing releases exactly these.
///
/// A session dropped before [`close`](Self::close) finishes, as when the scan
/// future is cancelled, hands its remaining ports to a background task on the
/// current runtime.
struct PortSession<T: Transport + ?Sized + 'static> {
    transport: Arc<T>,
    opened: Vec<Port>,
}

impl<T: Transport + ?Sized + 'static> PortSession<T> {
    fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            opened: Vec::new(),
        }
    }

    fn ports(&self) -> &[Port] {
        &self.opened
    }

    async fn open(&mut self, port: &Port, config: &DiscoveryConfig) -> Result<(), CommError> {
        let code = self
            .transport
            .open(slice::from_ref(port), config.auto_mode, config.live_mode)
            .await;
        translate(code).into_result()?;
        self.opened.push(port.clone());
        Ok(())
    }

    async fn close(mut self) {
        while !self.opened.is_empty() {
            let port = self.opened.remove(0);
            close_port(&*self.transport, port).await;
        }
    }
}

impl<T: Transport + ?Sized + 'static> Drop for PortSession<T> {
    fn drop(&mut self) {
        if self.opened.is_empty() {
            return;
        }
        let ports = mem::take(&mut self.opened);
        match Handle::try_current() {
            Ok(handle) => {
                debug!(ports = ?ports, "Scan abandoned, closing ports in background");
                let transport = self.transport.clone();
                handle.spawn(async move {
                    for port in ports {
                        close_port(&*transport, port).await;
                    }
                });
            }
            Err(_) => warn!(ports = ?ports, "Scan abandoned outside a runtime, ports left open"),
        }
    }
}

async fn close_port<T: Transport + ?Sized>(transport: &T, port: Port) {
    let code = transport.close(PortSelector::One(port.clone())).await;
    if let Err(e) = translate(code).into_result() {
        warn!(port = %port, error = %e, "Failed to close port");
    }
}

/// Runs scans against one transport.
pub struct DeviceDiscovery<T: ?Sized> {
    transport: Arc<T>,
    probe: ModuleProbe<T>,
}

impl<T: Transport + ?Sized + 'static> DeviceDiscovery<T> {
    pub fn new(transport: Arc<T>, config: DiscoveryConfig) -> Self {
        Self {
            probe: ModuleProbe::new(transport.clone(), config),
            transport,
        }
    }

    /// Every module matching `signature`, ports in transport order and
    /// addresses ascending.
    ///
    /// An empty port list yields no candidates without opening anything. A
    /// port that will not open (not found, no devices, failed) is skipped and
    /// the rest are scanned. A busy or unrecognized answer to an open aborts
    /// the scan after the ports opened so far are closed again.
    pub async fn scan(&self, signature: &TargetSignature) -> Result<Vec<Candidate>, CommError> {
        let ports = self.transport.list_ports().await;
        if ports.is_empty() {
            debug!(kind = signature.name, "No ports to scan");
            return Ok(Vec::new());
        }

        let mut session = PortSession::new(self.transport.clone());
        for port in &ports {
            match session.open(port, self.probe.config()).await {
                Ok(()) => {}
                Err(CommError::PortError { code, description }) => {
                    warn!(port = %port, code, description, "Port did not open, skipping");
                }
                Err(e) => {
                    warn!(port = %port, error = %e, "Failed to open port");
                    session.close().await;
                    return Err(e);
                }
            }
        }

        let mut candidates = Vec::new();
        for port in session.ports() {
            candidates.extend(self.scan_port(port, signature).await);
        }
        let scanned = session.ports().len();
        session.close().await;

        debug!(
            kind = signature.name,
            ports = scanned,
            found = candidates.len(),
            "Scan complete"
        );
        Ok(candidates)
    }

    async fn scan_port(&self, port: &Port, signature: &TargetSignature) -> Vec<Candidate> {
        let table = self.probe.device_types(port).await;
        if table.is_none() {
            debug!(port = %port, "Falling back to per-address probes");
        }

        let mut found = Vec::new();
        for address in signature.addresses.iter() {
            let device_type = match &table {
                Some(table) => table.type_at(address),
                None => self.probe.probe(port, address).await,
            };
            let Some(device_type) = device_type else {
                continue;
            };
            if signature.matches(device_type) {
                debug!(
                    kind = signature.name,
                    port = %port,
                    address,
                    device_type = %format!("0x{device_type:02X}"),
                    "Found module"
                );
                found.push(Candidate {
                    port: port.clone(),
                    address,
                    device_type,
                });
            } else {
                trace!(port = %port, address, device_type, "Other module kind");
            }
        }
        found
    }
}
