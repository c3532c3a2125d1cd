//! Error types for config loading and validation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned while loading or validating config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading a config file failed.
    #[error("failed to read config {}: {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid YAML or does not match the declared types.
    #[error("failed to decode config {}: {source}", .path.display())]
    DecodeFailed {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    /// A specific field failed validation.
    #[error("invalid config at {path}: {message}")]
    InvalidField { path: String, message: String },
}

impl ConfigError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFailed {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn decode(path: impl Into<PathBuf>, source: serde_yaml::Error) -> Self {
        Self::DecodeFailed {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidField {
            path: path.into(),
            message: message.into(),
        }
    }

    /// True when the error came from the filesystem rather than the document.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::ReadFailed { .. })
    }

    /// True when the document could not be decoded.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::DecodeFailed { .. })
    }
}
