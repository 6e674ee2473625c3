/*
    errors.rs - Error types shared by every config subsystem

    Defines the error taxonomy surfaced by:
    - Codec (decode failures)
    - CryptoBox (key and authentication failures)
    - Typed records (validation and capacity)
    - Cursors (contract violations)
*/

use thiserror::Error;

/// Errors that can occur in the config core
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Malformed identifier or field format
    #[error("Validation error: {0}")]
    Validation(String),

    /// Bytes were truncated or not the canonical encoding of their value
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Seal/open failed (short input, bad tag, bad padding)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Cursor misuse or illegal structural mutation
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    /// Value exceeds a fixed maximum length
    #[error("Capacity exceeded: {field} is {actual} bytes (max {max})")]
    Capacity {
        field: &'static str,
        actual: usize,
        max: usize,
    },

    /// Identity secret key has the wrong shape
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Result type for config operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Codec-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Input ended before the value was complete
    #[error("unexpected end of input at offset {0}")]
    Truncated(usize),

    /// Byte that cannot start or continue a value
    #[error("unexpected byte 0x{byte:02x} at offset {offset}")]
    UnexpectedByte { byte: u8, offset: usize },

    /// Integer or length prefix is malformed
    #[error("malformed number at offset {0}")]
    MalformedNumber(usize),

    /// Valid value but not in its unique canonical form
    #[error("non-canonical encoding at offset {offset}: {reason}")]
    NonCanonical { offset: usize, reason: &'static str },

    /// Dictionary key is not UTF-8
    #[error("dictionary key at offset {0} is not valid UTF-8")]
    InvalidKey(usize),

    /// Extra bytes after a complete value
    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),

    /// Nesting exceeds the configured limit
    #[error("nesting depth exceeds {0}")]
    TooDeep(usize),

    /// Input exceeds the configured size limit
    #[error("input of {actual} bytes exceeds limit of {max}")]
    TooLarge { actual: usize, max: usize },

    /// Well-formed value with the wrong structure
    #[error("invalid structure: {0}")]
    Structure(String),
}
