//! Translation of driver result codes into outcomes.
//!
//! The driver reports through three separate code tables: register
//! exchanges, port open/close, and device queries. Each namespace has its own
//! busy, timeout and port-failure codes, so codes are classified per
//! namespace. Classification is total: a code nobody documented is a device
//! error, never a success.

use strum::{EnumIter, EnumMessage, FromRepr};

use crate::error::CommError;
use crate::transport::{DeviceCode, PortCode, RegisterCode};

/// Register exchange results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr, EnumMessage, EnumIter)]
#[repr(i32)]
pub enum RegisterResult {
    #[strum(message = "success")]
    Success = 0,
    #[strum(message = "read error")]
    ReadError = 1,
    #[strum(message = "failed register")]
    FailedRegister = 2,
    #[strum(message = "module busy")]
    Busy = 3,
    #[strum(message = "request not acknowledged")]
    Nacked = 4,
    #[strum(message = "CRC error")]
    CrcError = 5,
    #[strum(message = "timeout")]
    Timeout = 6,
    #[strum(message = "communication error")]
    ComError = 7,
    #[strum(message = "register type error")]
    TypeError = 8,
    #[strum(message = "register index error")]
    IndexError = 9,
    #[strum(message = "port closed")]
    PortClosed = 10,
    #[strum(message = "register not found")]
    RegisterNotFound = 11,
    #[strum(message = "port open error")]
    PortOpenError = 12,
    #[strum(message = "device not found")]
    DeviceNotFound = 13,
    #[strum(message = "write error")]
    WriteError = 14,
    #[strum(message = "application busy")]
    ApplicationBusy = 15,
}

/// Port open/close results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr, EnumMessage, EnumIter)]
#[repr(i32)]
pub enum PortResult {
    #[strum(message = "success")]
    Success = 0,
    #[strum(message = "operation failed")]
    Failed = 1,
    #[strum(message = "port not found")]
    PortNotFound = 2,
    #[strum(message = "no devices on port")]
    NoDevices = 3,
    #[strum(message = "application busy")]
    ApplicationBusy = 4,
}

/// Device query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr, EnumMessage, EnumIter)]
#[repr(i32)]
pub enum DeviceResult {
    #[strum(message = "success")]
    Success = 0,
    #[strum(message = "wait timeout")]
    WaitTimeout = 1,
    #[strum(message = "failed")]
    Failed = 2,
    #[strum(message = "device not found")]
    DeviceNotFound = 3,
    #[strum(message = "port not found")]
    PortNotFound = 4,
    #[strum(message = "port open error")]
    PortOpenError = 5,
    #[strum(message = "application busy")]
    ApplicationBusy = 6,
}

/// A raw code tagged with the table it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    Register(i32),
    Port(i32),
    Device(i32),
}

impl From<RegisterCode> for ResultCode {
    fn from(code: RegisterCode) -> Self {
        Self::Register(code.0)
    }
}

impl From<PortCode> for ResultCode {
    fn from(code: PortCode) -> Self {
        Self::Port(code.0)
    }
}

impl From<DeviceCode> for ResultCode {
    fn from(code: DeviceCode) -> Self {
        Self::Device(code.0)
    }
}

/// Outcome of one transport exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommResult {
    Success,
    DeviceBusy,
    DeviceError(ResultCode),
    PortError(ResultCode),
    Timeout,
}

impl CommResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Convert into a `Result`, keeping the code's description.
    pub fn into_result(self) -> Result<(), CommError> {
        match self {
            Self::Success => Ok(()),
            Self::DeviceBusy => Err(CommError::Busy),
            Self::Timeout => Err(CommError::Timeout),
            Self::DeviceError(code) => Err(CommError::DeviceError {
                code: raw(code),
                description: describe(code),
            }),
            Self::PortError(code) => Err(CommError::PortError {
                code: raw(code),
                description: describe(code),
            }),
        }
    }
}

fn raw(code: ResultCode) -> i32 {
    match code {
        ResultCode::Register(c) | ResultCode::Port(c) | ResultCode::Device(c) => c,
    }
}

/// Classify a result code.
pub fn translate(code: impl Into<ResultCode>) -> CommResult {
    let code = code.into();
    match code {
        ResultCode::Register(c) => match RegisterResult::from_repr(c) {
            Some(RegisterResult::Success) => CommResult::Success,
            Some(RegisterResult::Busy | RegisterResult::ApplicationBusy) => CommResult::DeviceBusy,
            Some(RegisterResult::Timeout) => CommResult::Timeout,
            Some(
                RegisterResult::ComError
                | RegisterResult::PortClosed
                | RegisterResult::PortOpenError,
            ) => CommResult::PortError(code),
            _ => CommResult::DeviceError(code),
        },
        ResultCode::Port(c) => match PortResult::from_repr(c) {
            Some(PortResult::Success) => CommResult::Success,
            Some(PortResult::ApplicationBusy) => CommResult::DeviceBusy,
            Some(PortResult::Failed | PortResult::PortNotFound | PortResult::NoDevices) => {
                CommResult::PortError(code)
            }
            None => CommResult::DeviceError(code),
        },
        ResultCode::Device(c) => match DeviceResult::from_repr(c) {
            Some(DeviceResult::Success) => CommResult::Success,
            Some(DeviceResult::ApplicationBusy) => CommResult::DeviceBusy,
            Some(DeviceResult::WaitTimeout) => CommResult::Timeout,
            Some(DeviceResult::PortNotFound | DeviceResult::PortOpenError) => {
                CommResult::PortError(code)
            }
            _ => CommResult::DeviceError(code),
        },
    }
}

/// Vendor description of a code, or "unknown result code".
pub fn describe(code: impl Into<ResultCode>) -> &'static str {
    let message = match code.into() {
        ResultCode::Register(c) => RegisterResult::from_repr(c).and_then(|r| r.get_message()),
        ResultCode::Port(c) => PortResult::from_repr(c).and_then(|r| r.get_message()),
        ResultCode::Device(c) => DeviceResult::from_repr(c).and_then(|r| r.get_message()),
    };
    message.unwrap_or("unknown result code")
}
