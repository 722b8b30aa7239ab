//! SuperK Varia variable bandpass filter.

use crate::codec::{Scale, WireType};
use crate::discovery::{AddressRange, TargetSignature};
use crate::register::{common, RegisterDescriptor};
use crate::status::{BitTable, StatusBit};

pub const SIGNATURE: TargetSignature = TargetSignature {
    name: "SuperK Varia",
    device_types: &[0x68],
    addresses: AddressRange::Block {
        first: 16,
        count: 9,
    },
};

pub const STATUS_BITS: &BitTable = &[
    StatusBit::new(1, "interlock off"),
    StatusBit::new(2, "interlock loop in"),
    StatusBit::new(3, "interlock loop out"),
    StatusBit::new(5, "supply voltage low"),
    StatusBit::new(6, "module temperature range"),
    StatusBit::new(8, "shutter sensor 1"),
    StatusBit::new(9, "shutter sensor 2"),
    StatusBit::new(12, "filter 1 moving"),
    StatusBit::new(13, "filter 2 moving"),
    StatusBit::new(14, "filter 3 moving"),
    StatusBit::new(15, "error code present"),
];

pub const STATUS: RegisterDescriptor = common::STATUS_WORD.with_flags(STATUS_BITS);

pub const MONITOR_INPUT: RegisterDescriptor =
    RegisterDescriptor::new("monitor input", 0x13, WireType::U16).scaled(Scale::per(10, "%"));

/// Neutral density attenuation.
pub const ND_SETPOINT: RegisterDescriptor =
    RegisterDescriptor::new("ND setpoint", 0x32, WireType::U16)
        .scaled(Scale::per(10, "%"))
        .bounded(0.0, 100.0);

/// Short-wave-pass edge.
pub const SWP_SETPOINT: RegisterDescriptor =
    RegisterDescriptor::new("SWP setpoint", 0x33, WireType::U16)
        .scaled(Scale::per(10, "nm"))
        .bounded(350.0, 850.0);

/// Long-wave-pass edge.
pub const LWP_SETPOINT: RegisterDescriptor =
    RegisterDescriptor::new("LWP setpoint", 0x34, WireType::U16)
        .scaled(Scale::per(10, "nm"))
        .bounded(350.0, 850.0);
