//! SuperK Extreme / Fianium main unit.

use crate::codec::{RawPair, Scale, WireType};
use crate::discovery::{AddressRange, TargetSignature};
use crate::register::{common, RegisterDescriptor};
use crate::status::{BitTable, StatusBit};

pub const SIGNATURE: TargetSignature = TargetSignature {
    name: "SuperK Extreme",
    device_types: &[0x60],
    addresses: AddressRange::Fixed(15),
};

pub const STATUS_BITS: &BitTable = &[
    StatusBit::new(0, "emission on"),
    StatusBit::new(1, "interlock relays off"),
    StatusBit::new(2, "interlock supply voltage low"),
    StatusBit::new(3, "interlock loop open"),
    StatusBit::new(4, "output control signal low"),
    StatusBit::new(5, "supply voltage low"),
    StatusBit::new(6, "inlet temperature out of range"),
    StatusBit::new(7, "clock battery low voltage"),
    StatusBit::new(13, "CRC error on startup"),
    StatusBit::new(14, "log error code present"),
    StatusBit::new(15, "system error code present"),
];

pub const STATUS: RegisterDescriptor = common::STATUS_WORD.with_flags(STATUS_BITS);

pub const INLET_TEMPERATURE: RegisterDescriptor =
    RegisterDescriptor::new("inlet temperature", 0x11, WireType::S16).scaled(Scale::per(10, "°C"));

/// Operating mode, 0 through 4. See [`SETUP_MODES`].
pub const SETUP: RegisterDescriptor =
    RegisterDescriptor::new("setup", 0x16, WireType::U8).bounded(0.0, 4.0);

pub const SETUP_MODES: [&str; 5] = [
    "constant current",
    "constant power",
    "externally modulated current",
    "externally modulated power",
    "external feedback (power lock)",
];

/// 0 is off, 3 is on.
pub const EMISSION: RegisterDescriptor =
    RegisterDescriptor::new("emission", 0x30, WireType::U8).bounded(0.0, 3.0);

/// LSB is the circuit state, MSB the reason when the circuit is open.
/// Writing a value above zero resets the interlock, zero trips it.
pub const INTERLOCK: RegisterDescriptor = RegisterDescriptor::new("interlock", 0x32, WireType::Raw);

pub const PULSE_PICKER_RATIO: RegisterDescriptor =
    RegisterDescriptor::new("pulse picker ratio", 0x34, WireType::U16);

/// Seconds without communication before emission shuts off; 0 disables.
pub const WATCHDOG_INTERVAL: RegisterDescriptor =
    RegisterDescriptor::new("watchdog interval", 0x36, WireType::U8).scaled(Scale::unit("s"));

pub const POWER_LEVEL: RegisterDescriptor = RegisterDescriptor::new("power level", 0x37, WireType::U16)
    .scaled(Scale::per(10, "%"))
    .bounded(0.0, 100.0);

pub const CURRENT_LEVEL: RegisterDescriptor =
    RegisterDescriptor::new("current level", 0x38, WireType::U16)
        .scaled(Scale::per(10, "%"))
        .bounded(0.0, 100.0);

/// NIM trigger delay, 1023 steps of 9 ps.
pub const NIM_DELAY: RegisterDescriptor = RegisterDescriptor::new("NIM delay", 0x39, WireType::U16)
    .scaled(Scale::ratio(9, 1000, "ns"))
    .bounded(0.0, 9.207);

/// 0 for SuperK Extreme, 1 for Fianium.
pub const SYSTEM_TYPE: RegisterDescriptor =
    RegisterDescriptor::new("system type", 0x6B, WireType::U8);

const INTERLOCK_REASONS: [&str; 8] = [
    "interlock circuit open",
    "front panel interlock or key switch off",
    "door switch open",
    "external module interlock",
    "application interlock",
    "internal module interlock",
    "interlock power failure",
    "interlock disabled by light source",
];

/// Describe an [`INTERLOCK`] reading.
pub fn interlock_state(pair: RawPair) -> &'static str {
    match (pair.lsb, pair.msb) {
        (_, 255) => "interlock circuit failure",
        (0, reason) => INTERLOCK_REASONS
            .get(usize::from(reason))
            .copied()
            .unwrap_or("interlock off, unknown reason"),
        (1, _) => "waiting for interlock reset",
        (2, _) => "interlock is OK",
        _ => "unknown interlock state",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::decode;

    #[test]
    fn status_ignores_reserved_bits() {
        let flags = decode(0x0F01, STATUS_BITS);
        assert_eq!(flags.labels(), ["emission on"]);
    }

    #[test]
    fn interlock_readings() {
        assert_eq!(interlock_state(RawPair { lsb: 2, msb: 0 }), "interlock is OK");
        assert_eq!(interlock_state(RawPair { lsb: 0, msb: 2 }), "door switch open");
        assert_eq!(
            interlock_state(RawPair { lsb: 0, msb: 255 }),
            "interlock circuit failure"
        );
    }

    #[test]
    fn nim_delay_full_scale() {
        let bounds = NIM_DELAY.bounds.unwrap();
        assert_eq!(crate::codec::to_raw(bounds.max, &NIM_DELAY.scale), 1023.0);
    }
}
