//! Koheras BASIK fiber laser module.
//!
//! Standalone units answer at address 1. Rack installations number them
//! consecutively, so discovery looks at 1 through 8.
//!
//! Wavelength registers count in 1/10 pm; modulation levels and offsets are
//! in promille of full range and carry no further scaling.

use crate::codec::{Scale, WireType};
use crate::discovery::{AddressRange, TargetSignature};
use crate::register::{common, RegisterDescriptor};
use crate::status::{BitTable, StatusBit};

pub const SIGNATURE: TargetSignature = TargetSignature {
    name: "Koheras BASIK",
    device_types: &[0x33],
    addresses: AddressRange::Block { first: 1, count: 8 },
};

const PICOMETER_TENTHS: Scale = Scale::per(10_000, "nm");
const PROMILLE: Scale = Scale::unit("‰");
const HERTZ: Scale = Scale::unit("Hz");

pub const STATUS_BITS: &BitTable = &[
    StatusBit::new(0, "emission"),
    StatusBit::new(1, "interlock off"),
    StatusBit::new(4, "module disabled"),
    StatusBit::new(5, "supply voltage low"),
    StatusBit::new(6, "temperature out of range"),
    StatusBit::new(11, "waiting for temperature drop"),
    StatusBit::new(14, "wavelength stabilized"),
    StatusBit::new(15, "error code present"),
];

pub const STATUS: RegisterDescriptor = common::STATUS_WORD.with_flags(STATUS_BITS);

pub const SETUP_BITS: &BitTable = &[
    StatusBit::new(1, "narrow wavelength modulation range"),
    StatusBit::new(3, "wavelength modulation DC coupled"),
    StatusBit::new(4, "internal wavelength modulation"),
    StatusBit::new(5, "external wavelength modulation"),
    StatusBit::new(6, "modulation signal output"),
    StatusBit::new(9, "constant current"),
    StatusBit::new(11, "autostart"),
];

pub const SETUP: RegisterDescriptor =
    RegisterDescriptor::new("setup", 0x31, WireType::U16).with_flags(SETUP_BITS);

/// Bits of [`MODULATION_SETUP`]. The wavelength waveform spans bits 6 and 7:
/// sine, triangle, rising sawtooth, falling sawtooth.
pub const MODULATION_BITS: &BitTable = &[
    StatusBit::new(0, "amplitude frequency 2"),
    StatusBit::new(2, "amplitude waveform triangle"),
    StatusBit::new(4, "wavelength frequency 2"),
    StatusBit::new(6, "wavelength waveform bit 0"),
    StatusBit::new(7, "wavelength waveform bit 1"),
];

pub const MODULATION_SETUP: RegisterDescriptor =
    RegisterDescriptor::new("modulation setup", 0xB7, WireType::U16).with_flags(MODULATION_BITS);

/// Error values reported in the common error code register.
pub const ERROR_CODES: &[(u16, &str)] = &[
    (0, "no error"),
    (2, "interlock"),
    (3, "low voltage"),
    (7, "module temperature range"),
    (8, "module disabled"),
];

pub fn describe_error(code: u16) -> &'static str {
    ERROR_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map_or("unknown error", |&(_, text)| text)
}

pub const EMISSION: RegisterDescriptor =
    RegisterDescriptor::new("emission", 0x30, WireType::U8).bounded(0.0, 1.0);

pub const OUTPUT_POWER: RegisterDescriptor =
    RegisterDescriptor::new("output power", 0x17, WireType::U16).scaled(Scale::per(100, "mW"));

pub const OUTPUT_POWER_SETPOINT: RegisterDescriptor =
    RegisterDescriptor::new("output power setpoint", 0x22, WireType::U16)
        .scaled(Scale::per(100, "mW"));

pub const MODULE_TEMPERATURE: RegisterDescriptor =
    RegisterDescriptor::new("module temperature", 0x1C, WireType::S16)
        .scaled(Scale::per(10, "°C"));

/// Wavelength with zero offset.
pub const STANDARD_WAVELENGTH: RegisterDescriptor =
    RegisterDescriptor::new("standard wavelength", 0x32, WireType::U32).scaled(PICOMETER_TENTHS);

/// Offset setpoint from the standard wavelength.
pub const WAVELENGTH_OFFSET: RegisterDescriptor =
    RegisterDescriptor::new("wavelength offset", 0x2A, WireType::S16).scaled(PICOMETER_TENTHS);

/// Measured offset from the standard wavelength.
pub const WAVELENGTH_OFFSET_READOUT: RegisterDescriptor =
    RegisterDescriptor::new("wavelength offset readout", 0x72, WireType::S16)
        .scaled(PICOMETER_TENTHS);

pub const WAVELENGTH_MODULATION_LEVEL: RegisterDescriptor =
    RegisterDescriptor::new("wavelength modulation level", 0x2B, WireType::U16)
        .scaled(PROMILLE)
        .bounded(0.0, 1000.0);

/// Needs DC coupling and internal modulation in [`SETUP`].
pub const WAVELENGTH_MODULATION_OFFSET: RegisterDescriptor =
    RegisterDescriptor::new("wavelength modulation offset", 0x2F, WireType::S16)
        .scaled(PROMILLE)
        .bounded(-1000.0, 1000.0);

pub const AMPLITUDE_MODULATION_LEVEL: RegisterDescriptor =
    RegisterDescriptor::new("amplitude modulation level", 0x2C, WireType::U16)
        .scaled(PROMILLE)
        .bounded(0.0, 1000.0);

// Two F32 frequencies per register; MODULATION_SETUP picks the active one.
pub const WAVELENGTH_MODULATION_FREQUENCY_1: RegisterDescriptor =
    RegisterDescriptor::new("wavelength modulation frequency 1", 0xB8, WireType::F32)
        .at_index(0)
        .scaled(HERTZ)
        .bounded(0.0, 1e5);
pub const WAVELENGTH_MODULATION_FREQUENCY_2: RegisterDescriptor =
    RegisterDescriptor::new("wavelength modulation frequency 2", 0xB8, WireType::F32)
        .at_index(4)
        .scaled(HERTZ)
        .bounded(0.0, 1e5);
pub const AMPLITUDE_MODULATION_FREQUENCY_1: RegisterDescriptor =
    RegisterDescriptor::new("amplitude modulation frequency 1", 0xBA, WireType::F32)
        .at_index(0)
        .scaled(HERTZ)
        .bounded(0.0, 1e5);
pub const AMPLITUDE_MODULATION_FREQUENCY_2: RegisterDescriptor =
    RegisterDescriptor::new("amplitude modulation frequency 2", 0xBA, WireType::F32)
        .at_index(4)
        .scaled(HERTZ)
        .bounded(0.0, 1e5);

pub const TRIGGER_SETUP: RegisterDescriptor =
    RegisterDescriptor::new("trigger setup", 0xB4, WireType::U8);
pub const WAVELENGTH_MODULATION_ENABLED: RegisterDescriptor =
    RegisterDescriptor::new("wavelength modulation enabled", 0xB5, WireType::U8)
        .bounded(0.0, 1.0);
pub const AMPLITUDE_MODULATION_ENABLED: RegisterDescriptor =
    RegisterDescriptor::new("amplitude modulation enabled", 0xB6, WireType::U8)
        .bounded(0.0, 1.0);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::to_physical;
    use crate::status::decode;

    #[test]
    fn wavelength_scale() {
        // 1550.12 nm standard wavelength in 1/10 pm.
        let nm = to_physical(15_501_200.0, &STANDARD_WAVELENGTH.scale);
        assert!((nm - 1550.12).abs() < 1e-9);
    }

    #[test]
    fn setup_word() {
        let flags = decode(0x0818, SETUP_BITS);
        assert_eq!(
            flags.labels(),
            [
                "wavelength modulation DC coupled",
                "internal wavelength modulation",
                "autostart"
            ]
        );
    }

    #[test]
    fn error_descriptions() {
        assert_eq!(describe_error(3), "low voltage");
        assert_eq!(describe_error(99), "unknown error");
    }
}
