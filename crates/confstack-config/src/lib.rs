//! Layered, environment-aware YAML configuration.
//!
//! This crate owns loading the app/cloud/database/secrets file stack, merging
//! the `default` and active-environment sections, validating the result, and
//! handing out a frozen read-only [`ConfigManager`].

mod error;
mod loader;
mod manager;
mod model;
mod redact;
mod settings;
mod validate;

/// Public error type returned by loading, lookup and validation APIs.
pub use error::{ConfigError, ErrorKind};
/// Loader options and layer metadata.
pub use loader::{
    ConfigLayer, DEFAULT_ENVIRONMENT, DEFAULT_SCOPE, ENVIRONMENT_VAR, LayerScope, LoadOptions,
    STANDARD_FILES,
};
pub use manager::ConfigManager;
/// Typed view over the conventional settings layout.
pub use model::*;
pub use redact::{DEFAULT_REPLACEMENT, RedactionPolicy};
pub use settings::Settings;
/// Validation rules and report types.
pub use validate::{
    Severity, TypeRule, ValidationCheck, ValidationFinding, ValidationReport, ValidationRules,
    ValueKind, validate_settings,
};
