//! Error types and handling infrastructure for serialcup.
//!
//! Library code returns [`Result`] with [`SerialcupError`], built on `thiserror`.
//! The binary wraps these in `anyhow` to attach top-level context.
//!
//! Two failure classes deserve a note because callers treat them differently:
//!
//! - [`SerialcupError::TimeSpec`] is raised only for strings that clearly meant to be a
//!   timestamp (for example `now-5x`). Strings that are not a timestamp at all are not
//!   errors; the query engine treats them as labels.
//! - A bounded device read that times out is not an error either; sources report it as
//!   `Ok(None)`.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for serialcup operations.
#[derive(Error, Debug)]
pub enum SerialcupError {
    /// File system related errors (open, write, flush, read of log files)
    #[error("File operation failed: {message}")]
    FileError {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// No device matched the requested identifier
    #[error("No device found with identifier {device_id}")]
    DeviceNotFound { device_id: String },

    /// Device exists but could not be opened, configured or read
    #[error("Device operation failed: {message}")]
    DeviceError { message: String },

    /// A string that looked like a time specification could not be resolved
    #[error("Invalid time specification '{input}': {message}")]
    TimeSpec { input: String, message: String },

    /// Filter pattern failed to compile
    #[error("Invalid filter pattern: {message}")]
    Pattern { message: String },

    /// File name does not follow the segment naming scheme
    #[error("Not a segment file name: {}", path.display())]
    InvalidSegmentName { path: PathBuf },

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Invalid command line arguments
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Generic error for cases not covered by specific variants
    #[error("Operation failed: {message}")]
    Other { message: String },
}

/// Standard Result type for serialcup operations.
pub type Result<T> = std::result::Result<T, SerialcupError>;

impl SerialcupError {
    /// Create a FileError from an io::Error with additional context
    pub fn file_error(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::FileError {
            message: message.into(),
            source,
        }
    }

    /// Create a DeviceNotFound error for the identifier that matched nothing
    pub fn device_not_found(device_id: impl Into<String>) -> Self {
        Self::DeviceNotFound {
            device_id: device_id.into(),
        }
    }

    /// Create a DeviceError with a descriptive message
    pub fn device(message: impl Into<String>) -> Self {
        Self::DeviceError {
            message: message.into(),
        }
    }

    /// Create a TimeSpec error naming the offending input
    pub fn time_spec(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TimeSpec {
            input: input.into(),
            message: message.into(),
        }
    }

    /// Create a Pattern error with a descriptive message
    pub fn pattern(message: impl Into<String>) -> Self {
        Self::Pattern {
            message: message.into(),
        }
    }

    /// Create a ConfigError with a descriptive message
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create an InvalidArgument error with a descriptive message
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a generic Other error with a descriptive message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

// Automatic conversion from io::Error to SerialcupError
impl From<std::io::Error> for SerialcupError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::FileError {
                message: "File not found".to_string(),
                source: err,
            },
            std::io::ErrorKind::PermissionDenied => Self::FileError {
                message: "Permission denied".to_string(),
                source: err,
            },
            _ => Self::FileError {
                message: "IO operation failed".to_string(),
                source: err,
            },
        }
    }
}

impl From<regex::Error> for SerialcupError {
    fn from(err: regex::Error) -> Self {
        Self::pattern(err.to_string())
    }
}
