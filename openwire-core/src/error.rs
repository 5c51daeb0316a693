//! Error types for OpenWire operations.

use std::io;
use thiserror::Error;

/// The main error type for OpenWire operations.
#[derive(Debug, Error)]
pub enum OpenWireError {
    /// A copy or comparison was attempted across incompatible variants.
    #[error("type mismatch: expected type code {expected}, found {found}")]
    TypeMismatch {
        /// Type code of the receiving data structure.
        expected: u8,
        /// Type code of the offending source.
        found: u8,
    },

    /// A decoded type code has no registered constructor.
    #[error("unknown type code: {0}")]
    UnknownTypeCode(u8),

    /// The stream ended before the current field was complete.
    #[error("truncated stream: need {needed} bytes, have {remaining}")]
    TruncatedStream {
        /// Bytes the current field requires.
        needed: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },

    /// A field carried an implausible length or an invalid value.
    #[error("malformed field: {0}")]
    MalformedField(String),

    /// An empty shared handle was dereferenced.
    #[error("null pointer access: {0}")]
    NullPointerAccess(&'static str),

    /// A monitor operation failed or was called without holding the lock.
    #[error("synchronization failure: {0}")]
    SynchronizationFailure(String),

    /// The requested protocol version is outside the supported range.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u32),

    /// A bounded wait elapsed.
    #[error("timeout error: {0}")]
    Timeout(String),

    /// Protocol-level errors (oversized frames, bad handshakes).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Configuration errors (invalid settings).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// I/O errors from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A specialized `Result` type for OpenWire operations.
pub type Result<T> = std::result::Result<T, OpenWireError>;
