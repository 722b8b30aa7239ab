//! In-memory bus for tests and dry runs.
//!
//! `SimulatedBus` answers like the vendor driver: modules hold register
//! images, a missing module times out, a missing register reports "register
//! not found". Tests can queue result codes that the next calls return
//! instead of touching state, and inspect every port open/close and write
//! the crate issued.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{
    register::common::{self, DEVICE_TYPE_REGISTER},
    result::{DeviceResult, PortResult, RegisterResult},
    tracing::prelude::*,
    transport::{DeviceCode, Port, PortCode, PortSelector, RegisterCode, Transport},
};

/// Size of the driver's per-port device-type table.
const TABLE_LEN: usize = 256;

/// One register write as the bus saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    pub port: Port,
    pub address: u8,
    pub register: u8,
    pub index: Option<u8>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
struct SimModule {
    device_type: u8,
    registers: HashMap<u8, Vec<u8>>,
}

#[derive(Debug, Default)]
struct SimState {
    ports: Vec<Port>,
    modules: BTreeMap<(Port, u8), SimModule>,
    table_available: bool,
    table_latency: Option<Duration>,

    open_codes: VecDeque<PortCode>,
    close_codes: VecDeque<PortCode>,
    read_codes: VecDeque<RegisterCode>,
    write_codes: VecDeque<RegisterCode>,
    table_codes: VecDeque<DeviceCode>,

    reads: usize,
    table_reads: usize,
    writes: Vec<WriteRecord>,
    opened: Vec<Port>,
    closed: Vec<PortSelector>,
    open_now: Vec<Port>,
}

impl SimState {
    fn add_port(&mut self, port: &Port) {
        if !self.ports.contains(port) {
            self.ports.push(port.clone());
        }
    }
}

/// A [`Transport`] backed by in-memory register images.
#[derive(Debug)]
pub struct SimulatedBus {
    state: Mutex<SimState>,
}

impl Default for SimulatedBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedBus {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState {
                table_available: true,
                ..Default::default()
            }),
        }
    }

    /// Add a port with nothing on it.
    pub fn add_port(&self, port: impl Into<Port>) {
        self.state.lock().add_port(&port.into());
    }

    /// Place a module of `device_type` at `port`:`address`. Ports are listed
    /// in the order they were first added.
    pub fn add_module(&self, port: impl Into<Port>, address: u8, device_type: u8) {
        let port = port.into();
        let mut state = self.state.lock();
        state.add_port(&port);

        let mut module = SimModule {
            device_type,
            ..Default::default()
        };
        module.registers.insert(DEVICE_TYPE_REGISTER, vec![device_type]);
        module.registers.insert(common::STATUS_WORD.register, vec![0, 0]);
        state.modules.insert((port, address), module);
    }

    /// Replace a register image. Ignored if no module sits at the address.
    pub fn set_register(&self, port: impl Into<Port>, address: u8, register: u8, bytes: &[u8]) {
        let port = port.into();
        if let Some(module) = self.state.lock().modules.get_mut(&(port, address)) {
            module.registers.insert(register, bytes.to_vec());
        }
    }

    pub fn register(&self, port: impl Into<Port>, address: u8, register: u8) -> Option<Vec<u8>> {
        let port = port.into();
        self.state
            .lock()
            .modules
            .get(&(port, address))
            .and_then(|m| m.registers.get(&register).cloned())
    }

    /// Make the device-type table query fail, forcing per-address probes.
    pub fn disable_device_table(&self) {
        self.state.lock().table_available = false;
    }

    /// Delay every device-type table query by `latency`.
    pub fn set_table_latency(&self, latency: Duration) {
        self.state.lock().table_latency = Some(latency);
    }

    pub fn script_open_codes(&self, codes: impl IntoIterator<Item = PortCode>) {
        self.state.lock().open_codes.extend(codes);
    }

    pub fn script_close_codes(&self, codes: impl IntoIterator<Item = PortCode>) {
        self.state.lock().close_codes.extend(codes);
    }

    pub fn script_read_codes(&self, codes: impl IntoIterator<Item = RegisterCode>) {
        self.state.lock().read_codes.extend(codes);
    }

    pub fn script_write_codes(&self, codes: impl IntoIterator<Item = RegisterCode>) {
        self.state.lock().write_codes.extend(codes);
    }

    pub fn script_table_codes(&self, codes: impl IntoIterator<Item = DeviceCode>) {
        self.state.lock().table_codes.extend(codes);
    }

    /// Register reads issued so far, scripted ones included.
    pub fn read_count(&self) -> usize {
        self.state.lock().reads
    }

    pub fn table_read_count(&self) -> usize {
        self.state.lock().table_reads
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().writes.len()
    }

    pub fn writes(&self) -> Vec<WriteRecord> {
        self.state.lock().writes.clone()
    }

    /// Every port passed to `open`, in call order.
    pub fn opened_ports(&self) -> Vec<Port> {
        self.state.lock().opened.clone()
    }

    pub fn close_calls(&self) -> Vec<PortSelector> {
        self.state.lock().closed.clone()
    }

    /// Ports opened and not yet closed.
    pub fn open_ports(&self) -> Vec<Port> {
        self.state.lock().open_now.clone()
    }
}

const SUCCESS: i32 = 0;

#[async_trait]
impl Transport for SimulatedBus {
    async fn list_ports(&self) -> Vec<Port> {
        self.state.lock().ports.clone()
    }

    async fn open(&self, ports: &[Port], _auto_mode: bool, _live_mode: bool) -> PortCode {
        let mut state = self.state.lock();
        if let Some(code) = state.open_codes.pop_front() {
            if code.0 != SUCCESS {
                return code;
            }
        }
        for port in ports {
            if !state.ports.contains(port) {
                return PortCode(PortResult::PortNotFound as i32);
            }
            state.opened.push(port.clone());
            if !state.open_now.contains(port) {
                state.open_now.push(port.clone());
            }
        }
        PortCode(SUCCESS)
    }

    async fn close(&self, selector: PortSelector) -> PortCode {
        let mut state = self.state.lock();
        state.closed.push(selector.clone());
        match &selector {
            PortSelector::All => state.open_now.clear(),
            PortSelector::One(port) => state.open_now.retain(|p| p != port),
        }
        state.close_codes.pop_front().unwrap_or(PortCode(SUCCESS))
    }

    async fn read_register(
        &self,
        port: &Port,
        address: u8,
        register: u8,
        index: Option<u8>,
    ) -> (RegisterCode, Vec<u8>) {
        let mut state = self.state.lock();
        state.reads += 1;
        if let Some(code) = state.read_codes.pop_front() {
            if code.0 != SUCCESS {
                return (code, Vec::new());
            }
        }

        let Some(module) = state.modules.get(&(port.clone(), address)) else {
            return (RegisterCode(RegisterResult::Timeout as i32), Vec::new());
        };
        let Some(image) = module.registers.get(&register) else {
            return (RegisterCode(RegisterResult::RegisterNotFound as i32), Vec::new());
        };

        let offset = index.map_or(0, usize::from);
        match image.get(offset..) {
            Some(bytes) => (RegisterCode(SUCCESS), bytes.to_vec()),
            None => (RegisterCode(RegisterResult::IndexError as i32), Vec::new()),
        }
    }

    async fn write_register(
        &self,
        port: &Port,
        address: u8,
        register: u8,
        index: Option<u8>,
        bytes: &[u8],
    ) -> RegisterCode {
        let mut state = self.state.lock();
        state.writes.push(WriteRecord {
            port: port.clone(),
            address,
            register,
            index,
            bytes: bytes.to_vec(),
        });
        if let Some(code) = state.write_codes.pop_front() {
            if code.0 != SUCCESS {
                return code;
            }
        }

        let Some(module) = state.modules.get_mut(&(port.clone(), address)) else {
            return RegisterCode(RegisterResult::Timeout as i32);
        };
        let image = module.registers.entry(register).or_default();
        let offset = index.map_or(0, usize::from);
        if index.is_none() {
            image.clear();
        }
        if image.len() < offset + bytes.len() {
            image.resize(offset + bytes.len(), 0);
        }
        image[offset..offset + bytes.len()].copy_from_slice(bytes);
        trace!(port = %port, address, register, image = %hex::encode(&*image), "Simulated write");
        RegisterCode(SUCCESS)
    }

    async fn device_type_table(&self, port: &Port) -> (DeviceCode, Vec<u8>) {
        let latency = self.state.lock().table_latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state.lock();
        state.table_reads += 1;
        if let Some(code) = state.table_codes.pop_front() {
            if code.0 != SUCCESS {
                return (code, Vec::new());
            }
        }
        if !state.table_available {
            return (DeviceCode(DeviceResult::Failed as i32), Vec::new());
        }
        if !state.ports.contains(port) {
            return (DeviceCode(DeviceResult::PortNotFound as i32), Vec::new());
        }

        let mut table = vec![0u8; TABLE_LEN];
        for ((_, address), module) in state.modules.range((port.clone(), 0)..=(port.clone(), u8::MAX)) {
            table[usize::from(*address)] = module.device_type;
        }
        (DeviceCode(SUCCESS), table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn indexed_write_splices_into_image() {
        let bus = SimulatedBus::new();
        bus.add_module("COM1", 1, 0x33);
        bus.set_register("COM1", 1, 0xB8, &[0; 8]);

        let port = Port::new("COM1");
        let code = bus
            .write_register(&port, 1, 0xB8, Some(4), &2.5f32.to_le_bytes())
            .await;
        assert_eq!(code, RegisterCode(0));

        let image = bus.register("COM1", 1, 0xB8).unwrap();
        assert_eq!(&image[..4], &[0u8; 4]);
        assert_eq!(&image[4..], &2.5f32.to_le_bytes());

        let (code, bytes) = bus.read_register(&port, 1, 0xB8, Some(4)).await;
        assert_eq!(code, RegisterCode(0));
        assert_eq!(bytes, 2.5f32.to_le_bytes());
    }

    #[tokio::test]
    async fn table_only_lists_modules_on_that_port() {
        let bus = SimulatedBus::new();
        bus.add_module("COM1", 15, 0x60);
        bus.add_module("COM2", 16, 0x67);

        let (code, table) = bus.device_type_table(&"COM1".into()).await;
        assert_eq!(code, DeviceCode(0));
        assert_eq!(table[15], 0x60);
        assert_eq!(table[16], 0);
    }

    #[tokio::test]
    async fn missing_module_and_register_report_like_driver() {
        let bus = SimulatedBus::new();
        bus.add_module("COM1", 15, 0x60);
        let port = Port::new("COM1");

        let (code, _) = bus.read_register(&port, 16, 0x61, None).await;
        assert_eq!(code, RegisterCode(6));
        let (code, _) = bus.read_register(&port, 15, 0x37, None).await;
        assert_eq!(code, RegisterCode(11));
    }

    #[tokio::test]
    async fn open_and_close_are_recorded() {
        let bus = SimulatedBus::new();
        bus.add_port("COM1");
        bus.add_port("COM2");

        bus.open(&["COM1".into(), "COM2".into()], true, true).await;
        assert_eq!(bus.open_ports().len(), 2);

        bus.close(PortSelector::One("COM1".into())).await;
        assert_eq!(bus.open_ports(), vec![Port::new("COM2")]);
        assert_eq!(bus.opened_ports().len(), 2);
        assert_eq!(bus.close_calls(), vec![PortSelector::One("COM1".into())]);
    }
}
