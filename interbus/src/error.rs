//! Common error types for interbus.
//!
//! This module provides a centralized Error enum using thiserror, with the
//! three families the bus layer can fail in: discovery, communication, and
//! value encoding.

use thiserror::Error;

use crate::transport::Port;

/// Discovery could not produce exactly one binding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    /// No module of the requested kind answered on any port.
    #[error("no {kind} module found")]
    NotFound { kind: &'static str },

    /// More than one module of the requested kind answered.
    #[error("multiple {kind} modules found at {}; bind to an explicit port", format_locations(.locations))]
    Ambiguous {
        kind: &'static str,
        locations: Vec<(Port, u8)>,
    },

    /// A caller-asserted address holds a different module kind.
    #[error("{kind} expected at {port}:{address}, found device type 0x{found:02X}")]
    Mismatch {
        kind: &'static str,
        port: Port,
        address: u8,
        found: u8,
    },
}

fn format_locations(locations: &[(Port, u8)]) -> String {
    locations
        .iter()
        .map(|(port, address)| format!("{port}:{address}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A bus exchange did not succeed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommError {
    /// Another application or the module itself is busy; the caller may retry.
    #[error("bus busy")]
    Busy,

    #[error("device error {code}: {description}")]
    DeviceError { code: i32, description: &'static str },

    #[error("port error {code}: {description}")]
    PortError { code: i32, description: &'static str },

    #[error("no response before timeout")]
    Timeout,
}

/// A value could not be represented on, or recovered from, the wire.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodingError {
    /// The value does not fit the register's wire type.
    #[error("{value} does not fit wire type {wire_type}")]
    RangeExceeded { wire_type: &'static str, value: String },

    /// The value is outside the register's declared physical bounds.
    #[error("{value} {unit} outside permitted range [{min}, {max}]")]
    ValueOutOfRange {
        value: f64,
        min: f64,
        max: f64,
        unit: &'static str,
    },

    /// The register returned fewer bytes than the wire type needs.
    #[error("expected {expected} bytes at offset {offset}, got {actual}")]
    Truncated {
        expected: usize,
        offset: usize,
        actual: usize,
    },
}

/// Main error type for interbus operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Comm(#[from] CommError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// The caller asked for a Rust type the register's wire type cannot yield.
    #[error("register 0x{register:02X} holds {wire_type}, not {requested}")]
    TypeMismatch {
        register: u8,
        wire_type: &'static str,
        requested: &'static str,
    },

    /// A descriptor lacks something the operation requires.
    #[error("descriptor error: {0}")]
    Descriptor(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
