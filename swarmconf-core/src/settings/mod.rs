//! Runtime settings for config objects
//!
//! Environment- or file-based settings with defaults and validation. The
//! limits here bound how much work a single merge or dump load can be made
//! to do by untrusted input.

use crate::core_codec::DecodeLimits;
use serde::{Deserialize, Serialize};
use std::env;

mod error;

pub use error::SettingsError;

/// Settings shared by every config object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Codec limits
    pub codec: CodecSettings,

    /// Encryption settings
    pub crypto: CryptoSettings,

    /// Merge settings
    pub merge: MergeSettings,

    /// Logging settings
    pub logging: LoggingSettings,
}

/// Limits applied when decoding snapshots and dumps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecSettings {
    /// Maximum nesting depth of lists and dictionaries
    pub max_depth: usize,

    /// Maximum encoded size in bytes
    pub max_input_len: usize,
}

/// Encryption settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoSettings {
    /// Zero fill plaintexts to a bucket size before sealing
    pub pad_plaintext: bool,
}

/// Merge settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSettings {
    /// Snapshots beyond this count in one merge call are rejected
    pub max_snapshots_per_merge: usize,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON formatting
    pub json_format: bool,
}

impl Default for CodecSettings {
    fn default() -> Self {
        let limits = DecodeLimits::default();
        Self {
            max_depth: limits.max_depth,
            max_input_len: limits.max_input_len,
        }
    }
}

impl Default for CryptoSettings {
    fn default() -> Self {
        Self {
            pad_plaintext: true,
        }
    }
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            max_snapshots_per_merge: 256,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl CodecSettings {
    pub fn limits(&self) -> DecodeLimits {
        DecodeLimits {
            max_depth: self.max_depth,
            max_input_len: self.max_input_len,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, what: &str) -> Result<Option<T>, SettingsError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| SettingsError::InvalidValue(format!("Invalid {}: {}", what, e))),
        Err(_) => Ok(None),
    }
}

impl Settings {
    /// Load settings from environment variables
    ///
    /// Environment variables follow the pattern: SWARMCONF_<SECTION>_<KEY>
    /// Example: SWARMCONF_MERGE_MAX_SNAPSHOTS=64
    pub fn from_env() -> Result<Self, SettingsError> {
        let mut settings = Self::default();

        if let Some(depth) = parse_var("SWARMCONF_CODEC_MAX_DEPTH", "max depth")? {
            settings.codec.max_depth = depth;
        }
        if let Some(len) = parse_var("SWARMCONF_CODEC_MAX_INPUT_LEN", "max input length")? {
            settings.codec.max_input_len = len;
        }
        if let Some(pad) = parse_var("SWARMCONF_CRYPTO_PAD_PLAINTEXT", "padding flag")? {
            settings.crypto.pad_plaintext = pad;
        }
        if let Some(max) = parse_var("SWARMCONF_MERGE_MAX_SNAPSHOTS", "snapshot limit")? {
            settings.merge.max_snapshots_per_merge = max;
        }
        if let Ok(level) = env::var("SWARMCONF_LOG_LEVEL") {
            settings.logging.level = level;
        }
        if let Some(json) = parse_var("SWARMCONF_LOG_JSON", "JSON flag")? {
            settings.logging.json_format = json;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::FileReadError(e.to_string()))?;

        let settings: Self =
            toml::from_str(&contents).map_err(|e| SettingsError::ParseError(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.codec.max_depth < 8 {
            return Err(SettingsError::ValidationFailed(
                "max_depth must be at least 8".to_string(),
            ));
        }

        if self.codec.max_input_len == 0 {
            return Err(SettingsError::ValidationFailed(
                "max_input_len must be greater than 0".to_string(),
            ));
        }

        if self.merge.max_snapshots_per_merge == 0 {
            return Err(SettingsError::ValidationFailed(
                "max_snapshots_per_merge must be greater than 0".to_string(),
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(SettingsError::ValidationFailed(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        Ok(())
    }

    /// Save settings to a TOML file
    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<(), SettingsError> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| SettingsError::SerializeError(e.to_string()))?;

        std::fs::write(path, contents).map_err(|e| SettingsError::FileWriteError(e.to_string()))?;

        Ok(())
    }
}
