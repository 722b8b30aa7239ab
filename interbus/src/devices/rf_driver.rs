//! RF driver for the Select's acousto-optic crystals.
//!
//! Eight channels, each with its own wavelength, amplitude and modulation
//! register at `base + channel`.

use crate::codec::{Scale, WireType};
use crate::discovery::{AddressRange, TargetSignature};
use crate::register::{common, RegisterDescriptor};
use crate::status::{BitTable, StatusBit};

pub const SIGNATURE: TargetSignature = TargetSignature {
    name: "RF driver",
    device_types: &[0x66],
    addresses: AddressRange::Block {
        first: 16,
        count: 9,
    },
};

pub const CHANNELS: u8 = 8;

pub const STATUS_BITS: &BitTable = &[
    StatusBit::new(0, "emission"),
    StatusBit::new(5, "supply voltage low"),
    StatusBit::new(6, "module temperature range"),
    StatusBit::new(13, "AODS communication timeout"),
    StatusBit::new(14, "needs crystal info"),
    StatusBit::new(15, "error code present"),
];

pub const STATUS: RegisterDescriptor = common::STATUS_WORD.with_flags(STATUS_BITS);

pub const RF_POWER: RegisterDescriptor =
    RegisterDescriptor::new("RF power", 0x30, WireType::U8).bounded(0.0, 1.0);

pub const SETUP: RegisterDescriptor = RegisterDescriptor::new("setup", 0x31, WireType::U8);

pub const MIN_WAVELENGTH: RegisterDescriptor =
    RegisterDescriptor::new("minimum wavelength", 0x34, WireType::U32)
        .scaled(Scale::per(1000, "nm"));
pub const MAX_WAVELENGTH: RegisterDescriptor =
    RegisterDescriptor::new("maximum wavelength", 0x35, WireType::U32)
        .scaled(Scale::per(1000, "nm"));

pub const CRYSTAL_TEMPERATURE: RegisterDescriptor =
    RegisterDescriptor::new("crystal temperature", 0x38, WireType::S16)
        .scaled(Scale::per(10, "°C"));

pub const FSK_MODE: RegisterDescriptor = RegisterDescriptor::new("FSK mode", 0x3B, WireType::U8);
pub const DAUGHTER_BOARD: RegisterDescriptor =
    RegisterDescriptor::new("daughter board", 0x3C, WireType::U8);
pub const CONNECTED_CRYSTAL: RegisterDescriptor =
    RegisterDescriptor::new("connected crystal", 0x75, WireType::U8);

/// Wavelength setpoint of `channel`, or `None` past the last channel.
pub const fn wavelength(channel: u8) -> Option<RegisterDescriptor> {
    if channel >= CHANNELS {
        return None;
    }
    Some(
        RegisterDescriptor::new("channel wavelength", 0x90 + channel, WireType::U32)
            .scaled(Scale::per(1000, "nm")),
    )
}

pub const fn amplitude(channel: u8) -> Option<RegisterDescriptor> {
    if channel >= CHANNELS {
        return None;
    }
    Some(
        RegisterDescriptor::new("channel amplitude", 0xB0 + channel, WireType::U16)
            .scaled(Scale::per(10, "%"))
            .bounded(0.0, 100.0),
    )
}

pub const fn modulation(channel: u8) -> Option<RegisterDescriptor> {
    if channel >= CHANNELS {
        return None;
    }
    Some(
        RegisterDescriptor::new("channel modulation", 0xC0 + channel, WireType::U16)
            .scaled(Scale::per(10, "%"))
            .bounded(0.0, 100.0),
    )
}
