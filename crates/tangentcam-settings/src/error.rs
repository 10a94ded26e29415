//! Error types for the settings crate.

use std::io;
use tangentcam_core::Error;
use thiserror::Error;

/// Errors that can occur while loading, saving or checking a configuration.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML error: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    /// The file extension is neither `.toml` nor `.json`.
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// A configuration value is invalid.
    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },
}

impl SettingsError {
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Range checks in the option crates report core configuration errors.
impl From<Error> for SettingsError {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidConfiguration { name, reason } => Self::InvalidSetting { key: name, reason },
            other => Self::InvalidSetting {
                key: "config".to_string(),
                reason: other.to_string(),
            },
        }
    }
}

impl From<SettingsError> for Error {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::InvalidSetting { key, reason } => Error::InvalidConfiguration { name: key, reason },
            other => Error::InvalidConfiguration {
                name: "config".to_string(),
                reason: other.to_string(),
            },
        }
    }
}

/// Result type for settings operations.
pub type SettingsResult<T> = std::result::Result<T, SettingsError>;
