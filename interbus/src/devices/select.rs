//! SuperK Select acousto-optic filter.

use crate::codec::{Scale, WireType};
use crate::discovery::{AddressRange, TargetSignature};
use crate::register::{common, RegisterDescriptor};
use crate::status::{BitTable, StatusBit};

pub const SIGNATURE: TargetSignature = TargetSignature {
    name: "SuperK Select",
    device_types: &[0x67],
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
    StatusBit::new(10, "new crystal 1 temperature"),
    StatusBit::new(11, "new crystal 2 temperature"),
    StatusBit::new(15, "error code present"),
];

pub const STATUS: RegisterDescriptor = common::STATUS_WORD.with_flags(STATUS_BITS);

pub const MONITOR_1_READOUT: RegisterDescriptor =
    RegisterDescriptor::new("monitor 1 readout", 0x10, WireType::U16).scaled(Scale::per(10, "%"));
pub const MONITOR_2_READOUT: RegisterDescriptor =
    RegisterDescriptor::new("monitor 2 readout", 0x11, WireType::U16).scaled(Scale::per(10, "%"));

pub const MONITOR_1_GAIN: RegisterDescriptor =
    RegisterDescriptor::new("monitor 1 gain", 0x32, WireType::U8);
pub const MONITOR_2_GAIN: RegisterDescriptor =
    RegisterDescriptor::new("monitor 2 gain", 0x33, WireType::U8);

/// Which crystal the RF drive is routed to.
pub const RF_SWITCH: RegisterDescriptor =
    RegisterDescriptor::new("RF switch", 0x34, WireType::U8).bounded(0.0, 1.0);
pub const MONITOR_SWITCH: RegisterDescriptor =
    RegisterDescriptor::new("monitor switch", 0x35, WireType::U8);

pub const CRYSTAL_1_MIN_WAVELENGTH: RegisterDescriptor =
    RegisterDescriptor::new("crystal 1 minimum wavelength", 0x90, WireType::U32)
        .scaled(Scale::per(1000, "nm"));
pub const CRYSTAL_1_MAX_WAVELENGTH: RegisterDescriptor =
    RegisterDescriptor::new("crystal 1 maximum wavelength", 0x91, WireType::U32)
        .scaled(Scale::per(1000, "nm"));
pub const CRYSTAL_2_MIN_WAVELENGTH: RegisterDescriptor =
    RegisterDescriptor::new("crystal 2 minimum wavelength", 0xA0, WireType::U32)
        .scaled(Scale::per(1000, "nm"));
pub const CRYSTAL_2_MAX_WAVELENGTH: RegisterDescriptor =
    RegisterDescriptor::new("crystal 2 maximum wavelength", 0xA1, WireType::U32)
        .scaled(Scale::per(1000, "nm"));
