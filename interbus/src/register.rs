//! Register descriptors and module bindings.
//!
//! A device kind declares its registers as `const` descriptors. Bus traffic
//! is only ever issued against a [`ModuleBinding`], which discovery or an
//! explicit bind creates once and never changes.

use std::fmt;

use crate::codec::{Scale, WireType};
use crate::status::BitTable;
use crate::transport::Port;

/// Inclusive physical limits a write must respect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Static description of one register of one module kind.
#[derive(Debug, Clone, Copy)]
pub struct RegisterDescriptor {
    pub name: &'static str,
    pub register: u8,
    pub wire_type: WireType,
    /// Byte offset of the element inside a multi-slot register.
    pub element_index: Option<u8>,
    pub scale: Scale,
    pub bounds: Option<Bounds>,
    /// Bit vocabulary for status and setup registers.
    pub flags: Option<&'static BitTable>,
}

impl RegisterDescriptor {
    pub const fn new(name: &'static str, register: u8, wire_type: WireType) -> Self {
        Self {
            name,
            register,
            wire_type,
            element_index: None,
            scale: Scale::UNITY,
            bounds: None,
            flags: None,
        }
    }

    pub const fn at_index(mut self, index: u8) -> Self {
        self.element_index = Some(index);
        self
    }

    pub const fn scaled(mut self, scale: Scale) -> Self {
        self.scale = scale;
        self
    }

    pub const fn bounded(mut self, min: f64, max: f64) -> Self {
        self.bounds = Some(Bounds::new(min, max));
        self
    }

    pub const fn with_flags(mut self, table: &'static BitTable) -> Self {
        self.flags = Some(table);
        self
    }
}

impl fmt::Display for RegisterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X} {}", self.name, self.register, self.wire_type)?;
        if let Some(index) = self.element_index {
            write!(f, " @{index}")?;
        }
        f.write_str(")")
    }
}

/// Registers every module kind on the bus implements.
pub mod common {
    use super::RegisterDescriptor;
    use crate::codec::WireType;

    /// Register holding the module's device-type byte.
    pub const DEVICE_TYPE_REGISTER: u8 = 0x61;

    pub const DEVICE_TYPE: RegisterDescriptor =
        RegisterDescriptor::new("device type", DEVICE_TYPE_REGISTER, WireType::U8);
    pub const FIRMWARE_VERSION: RegisterDescriptor =
        RegisterDescriptor::new("firmware version", 0x64, WireType::Raw);
    pub const SERIAL_NUMBER: RegisterDescriptor =
        RegisterDescriptor::new("serial number", 0x65, WireType::Ascii);
    pub const STATUS_WORD: RegisterDescriptor =
        RegisterDescriptor::new("status", 0x66, WireType::U16);
    pub const ERROR_CODE: RegisterDescriptor =
        RegisterDescriptor::new("error code", 0x67, WireType::U16);
}

/// The resolved association of one module kind with one port and address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleBinding {
    port: Port,
    address: u8,
    device_type: u8,
}

impl ModuleBinding {
    pub(crate) fn new(port: Port, address: u8, device_type: u8) -> Self {
        Self {
            port,
            address,
            device_type,
        }
    }

    pub fn port(&self) -> &Port {
        &self.port
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn device_type(&self) -> u8 {
        self.device_type
    }
}

impl fmt::Display for ModuleBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} (type 0x{:02X})",
            self.port, self.address, self.device_type
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FREQUENCY_2: RegisterDescriptor =
        RegisterDescriptor::new("wavelength modulation frequency", 0xB8, WireType::F32)
            .at_index(4)
            .scaled(Scale::unit("Hz"))
            .bounded(0.0, 1e5);

    #[test]
    fn builder_is_usable_in_const_context() {
        assert_eq!(FREQUENCY_2.element_index, Some(4));
        assert_eq!(FREQUENCY_2.scale.unit, "Hz");
        assert!(FREQUENCY_2.bounds.is_some_and(|b| b.contains(1e5)));
        assert_eq!(
            FREQUENCY_2.to_string(),
            "wavelength modulation frequency (0xB8 F32 @4)"
        );
    }

    #[test]
    fn bounds_are_inclusive() {
        let b = Bounds::new(0.0, 1000.0);
        assert!(b.contains(0.0));
        assert!(b.contains(1000.0));
        assert!(!b.contains(1000.5));
        assert!(!b.contains(-0.1));
        assert!(!b.contains(f64::NAN));
    }
}
