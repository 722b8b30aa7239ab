//! Typed register reads and writes against one bound module.
//!
//! Every call is a single exchange. A busy bus surfaces as
//! [`CommError::Busy`](crate::error::CommError::Busy); retrying is the
//! caller's decision. Writes are validated against the descriptor (wire
//! range and physical bounds) before any byte goes out.

use std::sync::Arc;

use crate::{
    codec::{self, RawPair, Scale, TypedValue, WireType},
    error::{EncodingError, Error, Result},
    register::{common, ModuleBinding, RegisterDescriptor},
    result::translate,
    status::{self, StatusFlagSet},
    tracing::prelude::*,
    transport::Transport,
};

/// Rust types a register read can produce directly.
pub trait FromTypedValue: Sized {
    /// The wire type this Rust type reads from.
    const WIRE_TYPE: WireType;

    fn from_typed(value: TypedValue) -> Option<Self>;
}

macro_rules! from_typed_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl FromTypedValue for $ty {
            const WIRE_TYPE: WireType = WireType::$variant;

            fn from_typed(value: TypedValue) -> Option<Self> {
                match value {
                    TypedValue::$variant(v) => Some(v),
                    _ => None,
                }
            }
        })*
    };
}

from_typed_value! {
    u8 => U8,
    i8 => S8,
    u16 => U16,
    i16 => S16,
    u32 => U32,
    i32 => S32,
    f32 => F32,
    String => Ascii,
    RawPair => Raw,
}

/// A register read in physical units.
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterValue {
    Number(f64),
    Text(String),
    Raw(RawPair),
}

impl RegisterValue {
    fn from_typed(value: TypedValue, scale: &Scale) -> Self {
        let raw = match value {
            TypedValue::Ascii(text) => return Self::Text(text),
            TypedValue::Raw(pair) => return Self::Raw(pair),
            TypedValue::U8(v) => f64::from(v),
            TypedValue::S8(v) => f64::from(v),
            TypedValue::U16(v) => f64::from(v),
            TypedValue::S16(v) => f64::from(v),
            TypedValue::U32(v) => f64::from(v),
            TypedValue::S32(v) => f64::from(v),
            TypedValue::F32(v) => f64::from(v),
        };
        Self::Number(codec::to_physical(raw, scale))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Register interface onto one module.
///
/// Only obtainable from a [`ModuleBinding`], so all traffic goes to an
/// address that was discovered or explicitly bound.
pub struct RegisterAccess<T: ?Sized> {
    transport: Arc<T>,
    binding: ModuleBinding,
}

impl<T: Transport + ?Sized> RegisterAccess<T> {
    pub(crate) fn new(transport: Arc<T>, binding: ModuleBinding) -> Self {
        Self { transport, binding }
    }

    pub fn binding(&self) -> &ModuleBinding {
        &self.binding
    }

    /// Read a register into the Rust type matching its wire type, e.g.
    /// `read::<u16>` for a U16 register. A mismatched type fails before the
    /// bus is touched.
    pub async fn read<V: FromTypedValue>(&self, descriptor: &RegisterDescriptor) -> Result<V> {
        let mismatch = || Error::TypeMismatch {
            register: descriptor.register,
            wire_type: descriptor.wire_type.name(),
            requested: V::WIRE_TYPE.name(),
        };
        if descriptor.wire_type != V::WIRE_TYPE {
            return Err(mismatch());
        }
        V::from_typed(self.read_value(descriptor).await?).ok_or_else(mismatch)
    }

    /// Read and decode a register without scaling.
    pub async fn read_value(&self, descriptor: &RegisterDescriptor) -> Result<TypedValue> {
        let (code, bytes) = self
            .transport
            .read_register(
                self.binding.port(),
                self.binding.address(),
                descriptor.register,
                descriptor.element_index,
            )
            .await;
        trace!(
            module = %self.binding,
            register = %descriptor,
            code = code.0,
            bytes = %hex::encode(&bytes),
            "Read"
        );
        translate(code).into_result()?;

        // The driver already applied the element index.
        Ok(codec::decode(descriptor.wire_type, &bytes, None)?)
    }

    /// Read a register and apply its scale.
    pub async fn read_physical(&self, descriptor: &RegisterDescriptor) -> Result<RegisterValue> {
        let value = self.read_value(descriptor).await?;
        Ok(RegisterValue::from_typed(value, &descriptor.scale))
    }

    /// Write a raw value. Bounds are checked on the scaled value.
    pub async fn write<V: Into<TypedValue>>(
        &self,
        descriptor: &RegisterDescriptor,
        value: V,
    ) -> Result<()> {
        let value = value.into();
        if let Some(raw) = value.as_f64() {
            check_bounds(descriptor, codec::to_physical(raw, &descriptor.scale))?;
        }
        let bytes = codec::encode(descriptor.wire_type, &value)?;
        self.write_bytes(descriptor, &bytes).await
    }

    /// Write a value given in physical units. It is rounded to the nearest
    /// raw step for integer registers.
    pub async fn write_physical(&self, descriptor: &RegisterDescriptor, physical: f64) -> Result<()> {
        check_bounds(descriptor, physical)?;
        if !physical.is_finite() {
            return Err(EncodingError::RangeExceeded {
                wire_type: descriptor.wire_type.name(),
                value: physical.to_string(),
            }
            .into());
        }

        let value = match descriptor.wire_type {
            WireType::F32 => {
                TypedValue::F32(codec::to_raw_unrounded(physical, &descriptor.scale) as f32)
            }
            WireType::Ascii | WireType::Raw => {
                return Err(Error::Descriptor(format!(
                    "{descriptor} has no physical representation"
                )));
            }
            wire_type => {
                let raw = codec::to_raw(physical, &descriptor.scale);
                TypedValue::from_integer(wire_type, raw as i64)?
            }
        };
        let bytes = codec::encode(descriptor.wire_type, &value)?;
        self.write_bytes(descriptor, &bytes).await
    }

    /// Read a status or setup register and decode it with the descriptor's
    /// bit table.
    pub async fn read_status(&self, descriptor: &RegisterDescriptor) -> Result<StatusFlagSet> {
        let table = descriptor
            .flags
            .ok_or_else(|| Error::Descriptor(format!("{descriptor} has no bit table")))?;

        let raw = match self.read_value(descriptor).await? {
            TypedValue::U16(word) => word,
            TypedValue::U8(byte) => byte.into(),
            TypedValue::Raw(pair) => u16::from_le_bytes([pair.lsb, pair.msb]),
            _ => {
                return Err(Error::TypeMismatch {
                    register: descriptor.register,
                    wire_type: descriptor.wire_type.name(),
                    requested: WireType::U16.name(),
                })
            }
        };
        let flags = status::decode(raw, table);
        debug!(module = %self.binding, register = %descriptor, flags = %flags, "Status");
        Ok(flags)
    }

    /// Device-type byte as the module reports it now.
    pub async fn device_type(&self) -> Result<u8> {
        self.read(&common::DEVICE_TYPE).await
    }

    pub async fn serial_number(&self) -> Result<String> {
        self.read(&common::SERIAL_NUMBER).await
    }

    pub async fn firmware_version(&self) -> Result<RawPair> {
        self.read(&common::FIRMWARE_VERSION).await
    }

    pub async fn error_code(&self) -> Result<u16> {
        self.read(&common::ERROR_CODE).await
    }

    async fn write_bytes(&self, descriptor: &RegisterDescriptor, bytes: &[u8]) -> Result<()> {
        let code = self
            .transport
            .write_register(
                self.binding.port(),
                self.binding.address(),
                descriptor.register,
                descriptor.element_index,
                bytes,
            )
            .await;
        trace!(
            module = %self.binding,
            register = %descriptor,
            code = code.0,
            bytes = %hex::encode(bytes),
            "Write"
        );
        Ok(translate(code).into_result()?)
    }
}

fn check_bounds(descriptor: &RegisterDescriptor, physical: f64) -> Result<()> {
    match descriptor.bounds {
        Some(bounds) if !bounds.contains(physical) => Err(EncodingError::ValueOutOfRange {
            value: physical,
            min: bounds.min,
            max: bounds.max,
            unit: descriptor.scale.unit,
        }
        .into()),
        _ => Ok(()),
    }
}
