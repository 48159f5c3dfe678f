use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatterError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Device busy: {0}")]
    DeviceBusy(String),

    #[error("Invalid device: {0}")]
    InvalidDevice(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Device too small: {total_sectors} sectors (need at least {minimum_sectors})")]
    TooSmall {
        total_sectors: u64,
        minimum_sectors: u64,
    },

    #[error("Operation out of sequence: {0}")]
    SequenceError(String),

    /// Native status code with no named counterpart. Treat as a catch-all.
    #[error("Unknown error (code: {0})")]
    Unknown(u32),
}

/// Payload-free view of [`FormatterError`], handy for comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    AccessDenied,
    DeviceBusy,
    InvalidDevice,
    IoError,
    TooSmall,
    SequenceError,
    Unknown,
}

/// Narrow numeric result used at the engine boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum StatusCode {
    Success = 0,
    AccessDenied = 1,
    DeviceBusy = 2,
    InvalidDevice = 3,
    IoError = 4,
    TooSmall = 5,
    UnknownError = 6,
    SequenceError = 7,
}

impl StatusCode {
    pub fn from_raw(code: u32) -> Option<Self> {
        match code {
            0 => Some(StatusCode::Success),
            1 => Some(StatusCode::AccessDenied),
            2 => Some(StatusCode::DeviceBusy),
            3 => Some(StatusCode::InvalidDevice),
            4 => Some(StatusCode::IoError),
            5 => Some(StatusCode::TooSmall),
            6 => Some(StatusCode::UnknownError),
            7 => Some(StatusCode::SequenceError),
            _ => None,
        }
    }

    pub fn as_raw(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusCode::Success => "success",
            StatusCode::AccessDenied => "access denied",
            StatusCode::DeviceBusy => "device busy",
            StatusCode::InvalidDevice => "invalid device",
            StatusCode::IoError => "I/O error",
            StatusCode::TooSmall => "device too small",
            StatusCode::UnknownError => "unknown error",
            StatusCode::SequenceError => "sequence error",
        };
        write!(f, "{} ({})", name, self.as_raw())
    }
}

/// Lift a raw status code into a result.
///
/// `0` is success. Codes outside the known table come back as
/// [`FormatterError::Unknown`] carrying the raw value.
pub fn check_status(code: u32) -> Result<(), FormatterError> {
    let detail = "reported by native status";
    match StatusCode::from_raw(code) {
        Some(StatusCode::Success) => Ok(()),
        Some(StatusCode::AccessDenied) => Err(FormatterError::AccessDenied(detail.to_string())),
        Some(StatusCode::DeviceBusy) => Err(FormatterError::DeviceBusy(detail.to_string())),
        Some(StatusCode::InvalidDevice) => Err(FormatterError::InvalidDevice(detail.to_string())),
        Some(StatusCode::IoError) => Err(FormatterError::IoError(detail.to_string())),
        Some(StatusCode::TooSmall) => Err(FormatterError::TooSmall {
            total_sectors: 0,
            minimum_sectors: 0,
        }),
        Some(StatusCode::SequenceError) => Err(FormatterError::SequenceError(detail.to_string())),
        Some(StatusCode::UnknownError) | None => Err(FormatterError::Unknown(code)),
    }
}

impl FormatterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FormatterError::AccessDenied(_) => ErrorKind::AccessDenied,
            FormatterError::DeviceBusy(_) => ErrorKind::DeviceBusy,
            FormatterError::InvalidDevice(_) => ErrorKind::InvalidDevice,
            FormatterError::IoError(_) => ErrorKind::IoError,
            FormatterError::TooSmall { .. } => ErrorKind::TooSmall,
            FormatterError::SequenceError(_) => ErrorKind::SequenceError,
            FormatterError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::AccessDenied => StatusCode::AccessDenied,
            ErrorKind::DeviceBusy => StatusCode::DeviceBusy,
            ErrorKind::InvalidDevice => StatusCode::InvalidDevice,
            ErrorKind::IoError => StatusCode::IoError,
            ErrorKind::TooSmall => StatusCode::TooSmall,
            ErrorKind::SequenceError => StatusCode::SequenceError,
            ErrorKind::Unknown => StatusCode::UnknownError,
        }
    }

    /// Raw numeric code, preserving the payload of `Unknown`.
    pub fn raw_code(&self) -> u32 {
        match self {
            FormatterError::Unknown(code) => *code,
            other => other.status_code().as_raw(),
        }
    }

    /// Classify an OS error raised while performing `operation`.
    pub fn from_io(operation: &str, err: io::Error) -> Self {
        let message = format!("{}: {}", operation, err);
        match classify_io_error(&err) {
            StatusCode::AccessDenied => FormatterError::AccessDenied(message),
            StatusCode::DeviceBusy => FormatterError::DeviceBusy(message),
            _ => FormatterError::IoError(message),
        }
    }
}

/// Map an OS error onto the status table. Anything not recognised as a
/// permission or busy condition is a plain I/O failure.
pub fn classify_io_error(err: &io::Error) -> StatusCode {
    if err.kind() == io::ErrorKind::PermissionDenied {
        return StatusCode::AccessDenied;
    }

    match err.raw_os_error() {
        Some(raw) => classify_os_code(raw),
        None => StatusCode::IoError,
    }
}

#[cfg(unix)]
fn classify_os_code(raw: i32) -> StatusCode {
    use nix::errno::Errno;

    if raw == Errno::EACCES as i32 || raw == Errno::EPERM as i32 || raw == Errno::EROFS as i32 {
        StatusCode::AccessDenied
    } else if raw == Errno::EBUSY as i32 {
        StatusCode::DeviceBusy
    } else {
        StatusCode::IoError
    }
}

#[cfg(windows)]
fn classify_os_code(raw: i32) -> StatusCode {
    const ERROR_ACCESS_DENIED: i32 = 5;
    const ERROR_WRITE_PROTECT: i32 = 19;
    const ERROR_SHARING_VIOLATION: i32 = 32;
    const ERROR_LOCK_VIOLATION: i32 = 33;
    const ERROR_BUSY: i32 = 170;

    match raw {
        ERROR_ACCESS_DENIED | ERROR_WRITE_PROTECT => StatusCode::AccessDenied,
        ERROR_SHARING_VIOLATION | ERROR_LOCK_VIOLATION | ERROR_BUSY => StatusCode::DeviceBusy,
        _ => StatusCode::IoError,
    }
}

#[cfg(not(any(unix, windows)))]
fn classify_os_code(_raw: i32) -> StatusCode {
    StatusCode::IoError
}
