//! Error types for srwp.

use std::io;
use thiserror::Error;

/// Result type for srwp operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for srwp operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (serial port, file operations).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serial port error.
    #[cfg(feature = "native")]
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// The transport could not be opened.
    #[error("Cannot open {port}: {source}")]
    Connection {
        /// Port name/path that failed to open.
        port: String,
        /// Underlying cause.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Auto-discovery found no candidate device.
    #[error("No device found matching {pattern}")]
    NotFound {
        /// Human-readable description of what was searched.
        pattern: String,
    },

    /// Auto-discovery found more than one candidate device.
    #[error(
        "More than one device found: {}. Please specify the device explicitly.",
        candidates.join(", ")
    )]
    Ambiguous {
        /// All candidate paths.
        candidates: Vec<String>,
    },

    /// The device returned fewer bytes than requested on every attempt.
    #[error(
        "Incomplete read at 0x{address:08X}: expected {expected} bytes, got {actual} after {attempts} attempt(s)"
    )]
    IncompleteRead {
        /// Start address of the failed region.
        address: u32,
        /// Requested byte count.
        expected: usize,
        /// Bytes received on the last attempt.
        actual: usize,
        /// Number of attempts made.
        attempts: u32,
    },

    /// Buffer length does not match the device size.
    #[error("Size mismatch: device holds {expected} bytes, buffer has {actual}")]
    SizeMismatch {
        /// Device size.
        expected: usize,
        /// Buffer length.
        actual: usize,
    },

    /// Invalid argument.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid discovery pattern.
    #[error("Invalid device pattern: {0}")]
    Glob(String),

    /// Operation stopped by the embedding application.
    #[error("Operation interrupted")]
    Interrupted,
}

impl Error {
    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

impl From<glob::PatternError> for Error {
    fn from(err: glob::PatternError) -> Self {
        Self::Glob(err.to_string())
    }
}
