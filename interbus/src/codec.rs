//! Register value encoding.
//!
//! Registers carry little-endian integers of 8, 16 or 32 bits, IEEE-754
//! single floats, NUL-terminated ASCII runs, or a two-byte pair whose bytes
//! hold independent sub-fields. Every register also has a rational scale
//! mapping its raw integer to a physical quantity (raw unit 1/100 mW gives a
//! factor of 0.01).
//!
//! Everything here is a pure function over its inputs.

use strum::{Display, EnumIter, IntoStaticStr};

use crate::error::EncodingError;

/// On-the-wire representation of a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, EnumIter)]
pub enum WireType {
    U8,
    S8,
    U16,
    S16,
    U32,
    S32,
    F32,
    Ascii,
    Raw,
}

impl WireType {
    /// Byte width, or `None` for variable-length text.
    pub fn width(self) -> Option<usize> {
        match self {
            Self::U8 | Self::S8 => Some(1),
            Self::U16 | Self::S16 | Self::Raw => Some(2),
            Self::U32 | Self::S32 | Self::F32 => Some(4),
            Self::Ascii => None,
        }
    }

    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Representable integer range, for the integer types.
    pub fn integer_range(self) -> Option<(i64, i64)> {
        match self {
            Self::U8 => Some((0, u8::MAX as i64)),
            Self::S8 => Some((i8::MIN as i64, i8::MAX as i64)),
            Self::U16 => Some((0, u16::MAX as i64)),
            Self::S16 => Some((i16::MIN as i64, i16::MAX as i64)),
            Self::U32 => Some((0, u32::MAX as i64)),
            Self::S32 => Some((i32::MIN as i64, i32::MAX as i64)),
            Self::F32 | Self::Ascii | Self::Raw => None,
        }
    }
}

/// A register whose two bytes carry separate fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawPair {
    pub lsb: u8,
    pub msb: u8,
}

/// Decoded register contents before scaling.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    U8(u8),
    S8(i8),
    U16(u16),
    S16(i16),
    U32(u32),
    S32(i32),
    F32(f32),
    Ascii(String),
    Raw(RawPair),
}

impl TypedValue {
    pub fn wire_type(&self) -> WireType {
        match self {
            Self::U8(_) => WireType::U8,
            Self::S8(_) => WireType::S8,
            Self::U16(_) => WireType::U16,
            Self::S16(_) => WireType::S16,
            Self::U32(_) => WireType::U32,
            Self::S32(_) => WireType::S32,
            Self::F32(_) => WireType::F32,
            Self::Ascii(_) => WireType::Ascii,
            Self::Raw(_) => WireType::Raw,
        }
    }

    /// Numeric value, for everything but text and raw pairs.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::U8(v) => Some(v.into()),
            Self::S8(v) => Some(v.into()),
            Self::U16(v) => Some(v.into()),
            Self::S16(v) => Some(v.into()),
            Self::U32(v) => Some(v.into()),
            Self::S32(v) => Some(v.into()),
            Self::F32(v) => Some(v.into()),
            Self::Ascii(_) | Self::Raw(_) => None,
        }
    }

    /// Narrow an integer into `wire_type`, failing if it does not fit.
    pub fn from_integer(wire_type: WireType, value: i64) -> Result<Self, EncodingError> {
        let out_of_range = || EncodingError::RangeExceeded {
            wire_type: wire_type.name(),
            value: value.to_string(),
        };
        Ok(match wire_type {
            WireType::U8 => Self::U8(u8::try_from(value).map_err(|_| out_of_range())?),
            WireType::S8 => Self::S8(i8::try_from(value).map_err(|_| out_of_range())?),
            WireType::U16 => Self::U16(u16::try_from(value).map_err(|_| out_of_range())?),
            WireType::S16 => Self::S16(i16::try_from(value).map_err(|_| out_of_range())?),
            WireType::U32 => Self::U32(u32::try_from(value).map_err(|_| out_of_range())?),
            WireType::S32 => Self::S32(i32::try_from(value).map_err(|_| out_of_range())?),
            WireType::F32 => Self::F32(value as f32),
            WireType::Raw => {
                let word = u16::try_from(value).map_err(|_| out_of_range())?;
                let [lsb, msb] = word.to_le_bytes();
                Self::Raw(RawPair { lsb, msb })
            }
            WireType::Ascii => return Err(out_of_range()),
        })
    }
}

macro_rules! typed_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for TypedValue {
            fn from(v: $ty) -> Self {
                Self::$variant(v)
            }
        })*
    };
}

typed_value_from! {
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

impl From<&str> for TypedValue {
    fn from(v: &str) -> Self {
        Self::Ascii(v.to_string())
    }
}

/// Interpret `raw` as `wire_type`, starting at byte offset `index`
/// (`None` for the start of the register).
pub fn decode(wire_type: WireType, raw: &[u8], index: Option<u8>) -> Result<TypedValue, EncodingError> {
    let offset = index.map_or(0, usize::from);
    let bytes = raw.get(offset..).unwrap_or(&[]);

    Ok(match wire_type {
        WireType::U8 => TypedValue::U8(take::<1>(bytes, offset)?[0]),
        WireType::S8 => TypedValue::S8(i8::from_le_bytes(take(bytes, offset)?)),
        WireType::U16 => TypedValue::U16(u16::from_le_bytes(take(bytes, offset)?)),
        WireType::S16 => TypedValue::S16(i16::from_le_bytes(take(bytes, offset)?)),
        WireType::U32 => TypedValue::U32(u32::from_le_bytes(take(bytes, offset)?)),
        WireType::S32 => TypedValue::S32(i32::from_le_bytes(take(bytes, offset)?)),
        WireType::F32 => TypedValue::F32(f32::from_le_bytes(take(bytes, offset)?)),
        WireType::Raw => {
            let [lsb, msb] = take(bytes, offset)?;
            TypedValue::Raw(RawPair { lsb, msb })
        }
        WireType::Ascii => {
            let text = bytes.split(|&b| b == 0).next().unwrap_or(&[]);
            TypedValue::Ascii(text.iter().map(|&b| char::from(b)).collect())
        }
    })
}

fn take<const N: usize>(bytes: &[u8], offset: usize) -> Result<[u8; N], EncodingError> {
    bytes
        .get(..N)
        .and_then(|b| b.try_into().ok())
        .ok_or(EncodingError::Truncated {
            expected: N,
            offset,
            actual: bytes.len(),
        })
}

/// Encode `value` for a register of `wire_type`.
///
/// Integer values of a different variant are narrowed with a range check, so
/// `TypedValue::U32(70000)` fails against `U16` but `TypedValue::U32(7)`
/// encodes fine.
pub fn encode(wire_type: WireType, value: &TypedValue) -> Result<Vec<u8>, EncodingError> {
    let out_of_range = || EncodingError::RangeExceeded {
        wire_type: wire_type.name(),
        value: format!("{value:?}"),
    };

    let narrowed = match (wire_type, value) {
        (WireType::Ascii, TypedValue::Ascii(text)) => {
            if !text.is_ascii() || text.contains('\0') {
                return Err(out_of_range());
            }
            let mut bytes = text.as_bytes().to_vec();
            bytes.push(0);
            return Ok(bytes);
        }
        (WireType::Ascii, _) | (_, TypedValue::Ascii(_)) => return Err(out_of_range()),
        (WireType::F32, v) => TypedValue::F32(v.as_f64().ok_or_else(out_of_range)? as f32),
        (WireType::Raw, TypedValue::Raw(pair)) => TypedValue::Raw(*pair),
        (_, TypedValue::Raw(pair)) => {
            TypedValue::from_integer(wire_type, u16::from_le_bytes([pair.lsb, pair.msb]).into())?
        }
        (_, TypedValue::F32(v)) => {
            if !v.is_finite() || v.fract() != 0.0 {
                return Err(out_of_range());
            }
            TypedValue::from_integer(wire_type, *v as i64)?
        }
        (_, v) => {
            // Integer variants hold at most 32 bits, so the f64 is exact.
            let n = v.as_f64().ok_or_else(out_of_range)? as i64;
            TypedValue::from_integer(wire_type, n)?
        }
    };

    Ok(match narrowed {
        TypedValue::U8(v) => vec![v],
        TypedValue::S8(v) => v.to_le_bytes().to_vec(),
        TypedValue::U16(v) => v.to_le_bytes().to_vec(),
        TypedValue::S16(v) => v.to_le_bytes().to_vec(),
        TypedValue::U32(v) => v.to_le_bytes().to_vec(),
        TypedValue::S32(v) => v.to_le_bytes().to_vec(),
        TypedValue::F32(v) => v.to_le_bytes().to_vec(),
        TypedValue::Raw(pair) => vec![pair.lsb, pair.msb],
        TypedValue::Ascii(_) => return Err(out_of_range()),
    })
}

/// Rational factor and unit mapping raw register integers to physical
/// quantities: `physical = raw * numerator / denominator`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub numerator: u32,
    pub denominator: u32,
    pub unit: &'static str,
}

impl Scale {
    /// Raw value is the physical value.
    pub const UNITY: Scale = Scale::ratio(1, 1, "");

    pub const fn ratio(numerator: u32, denominator: u32, unit: &'static str) -> Self {
        Self {
            numerator,
            denominator,
            unit,
        }
    }

    /// Raw unit is `1/denominator` of `unit`.
    pub const fn per(denominator: u32, unit: &'static str) -> Self {
        Self::ratio(1, denominator, unit)
    }

    pub const fn unit(unit: &'static str) -> Self {
        Self::ratio(1, 1, unit)
    }

    pub fn factor(&self) -> f64 {
        f64::from(self.numerator) / f64::from(self.denominator)
    }

    pub fn is_unity(&self) -> bool {
        self.numerator == self.denominator
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::UNITY
    }
}

/// Apply `scale` to a raw register value.
pub fn to_physical(raw: f64, scale: &Scale) -> f64 {
    raw * f64::from(scale.numerator) / f64::from(scale.denominator)
}

/// Undo `scale`, rounding to the nearest raw integer.
pub fn to_raw(physical: f64, scale: &Scale) -> f64 {
    (physical * f64::from(scale.denominator) / f64::from(scale.numerator)).round()
}

/// Undo `scale` without rounding, for float registers.
pub fn to_raw_unrounded(physical: f64, scale: &Scale) -> f64 {
    physical * f64::from(scale.denominator) / f64::from(scale.numerator)
}
