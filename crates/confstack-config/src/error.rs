//! Error types for config loading, lookup and validation.

use crate::validate::ValidationReport;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of [`ConfigError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A config file was missing, unreadable or malformed.
    Load,
    /// One or more validation checks failed.
    Validation,
    /// A key lookup or path operation failed.
    Key,
    /// A mutation was attempted after freezing.
    Frozen,
}

/// Errors returned while loading, reading or validating config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A listed config file does not exist.
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// Reading a config file failed.
    #[error("failed to read config {}: {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A config file is not valid YAML.
    #[error("failed to parse config {}: {source}", .path.display())]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    /// A document or scope section is not a mapping.
    #[error("invalid config {}: {section} must be a mapping", .path.display())]
    NotAMapping { path: PathBuf, section: String },
    /// Validation failed; the report holds every finding.
    #[error("config validation failed with {count} error(s):\n{0}", count = .0.error_count())]
    Validation(ValidationReport),
    /// A required key is absent.
    #[error("missing required config key: {0}")]
    MissingKey(String),
    /// A present value could not be decoded into the requested type.
    #[error("failed to decode config key {key}: {source}")]
    DecodeFailed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    /// A dotted path cannot be written.
    #[error("invalid config path {key}: {message}")]
    InvalidPath { key: String, message: String },
    /// The config has been frozen.
    #[error("config is frozen; cannot modify {0}")]
    Frozen(String),
}

impl ConfigError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_)
            | Self::ReadFailed { .. }
            | Self::ParseFailed { .. }
            | Self::NotAMapping { .. } => ErrorKind::Load,
            Self::Validation(_) => ErrorKind::Validation,
            Self::MissingKey(_) | Self::DecodeFailed { .. } | Self::InvalidPath { .. } => {
                ErrorKind::Key
            }
            Self::Frozen(_) => ErrorKind::Frozen,
        }
    }

    /// The validation report, when this is a validation failure.
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            Self::Validation(report) => Some(report),
            _ => None,
        }
    }
}
