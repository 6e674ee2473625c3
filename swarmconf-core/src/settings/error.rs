//! Settings error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    FileReadError(String),

    #[error("Failed to write settings file: {0}")]
    FileWriteError(String),

    #[error("Failed to parse settings: {0}")]
    ParseError(String),

    #[error("Failed to serialize settings: {0}")]
    SerializeError(String),

    #[error("Invalid settings value: {0}")]
    InvalidValue(String),

    #[error("Settings validation failed: {0}")]
    ValidationFailed(String),
}
