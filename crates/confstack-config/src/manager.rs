//! The config handle: loaded once, validated once, then frozen.

use crate::loader::{self, ConfigLayer, LoadOptions};
use crate::validate::{ValidationReport, ValidationRules, validate_settings};
use crate::{AppSettings, ConfigError, LogLevel, RedactionPolicy, Settings};
use log::info;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Merged, environment-scoped settings with a one-way freeze.
///
/// A manager starts out *loaded* and may be written with [`ConfigManager::set`].
/// A successful [`ConfigManager::validate`] (or an explicit
/// [`ConfigManager::freeze`]) makes it read-only for the rest of its life.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    settings: Settings,
    environment: String,
    base_dir: PathBuf,
    layers: Vec<ConfigLayer>,
    secrets_file: Option<PathBuf>,
    frozen: bool,
}

impl ConfigManager {
    /// Load and merge the configured files.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let loaded = loader::load(&options)?;
        Ok(Self {
            settings: loaded.settings,
            environment: loaded.environment,
            base_dir: loaded.base_dir,
            layers: loaded.layers,
            secrets_file: options.secrets_file,
            frozen: false,
        })
    }

    /// Load, validate and freeze in one step.
    pub fn bootstrap(
        options: LoadOptions,
        rules: &ValidationRules,
    ) -> Result<(Self, ValidationReport), ConfigError> {
        let mut manager = Self::load(options)?;
        let report = manager.validate(rules)?;
        Ok((manager, report))
    }

    /// Wrap an already-built tree; relative paths resolve against `base_dir`.
    pub fn from_settings(
        settings: Settings,
        environment: impl Into<String>,
        base_dir: impl AsRef<Path>,
    ) -> Self {
        Self {
            settings,
            environment: environment.into().to_lowercase(),
            base_dir: base_dir.as_ref().to_path_buf(),
            layers: Vec::new(),
            secrets_file: None,
            frozen: false,
        }
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Files that contributed to the tree, in merge order.
    pub fn layers(&self) -> &[ConfigLayer] {
        &self.layers
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Value at a dotted path, or `None` if any segment is absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.settings.get(key)
    }

    /// Value at a dotted path, or `default` if any segment is absent.
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.settings.get(key).cloned().unwrap_or(default)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.settings.contains(key)
    }

    /// Decode the value at `key`; absence is `Ok(None)`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        self.settings
            .get(key)
            .map(|value| decode(key, value))
            .transpose()
    }

    /// Value at a dotted path, failing with [`ConfigError::MissingKey`].
    pub fn get_required(&self, key: &str) -> Result<&Value, ConfigError> {
        self.settings
            .get(key)
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
    }

    pub fn get_required_as<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        decode(key, self.get_required(key)?)
    }

    /// Write a value at a dotted path; fails once frozen.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), ConfigError> {
        if self.frozen {
            return Err(ConfigError::Frozen(key.to_string()));
        }
        self.settings.set(key, value.into())
    }

    /// Make the tree read-only. Freezing twice is a no-op.
    pub fn freeze(&mut self) {
        if !self.frozen {
            info!("config frozen (environment={})", self.environment);
            self.frozen = true;
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Run every check; freeze and return the report when nothing is fatal.
    ///
    /// Warnings are logged. The secrets file given at load time is always
    /// required to exist.
    pub fn validate(&mut self, rules: &ValidationRules) -> Result<ValidationReport, ConfigError> {
        let report = match &self.secrets_file {
            Some(secrets_file) if !rules.required_files.contains(secrets_file) => {
                let rules = rules.clone().require_file(secrets_file);
                validate_settings(&self.settings, &rules, &self.base_dir)
            }
            _ => validate_settings(&self.settings, rules, &self.base_dir),
        };
        report.log_warnings();
        if report.has_errors() {
            return Err(ConfigError::Validation(report));
        }
        info!(
            "config validated (environment={}, warnings={})",
            self.environment,
            report.warning_count()
        );
        self.freeze();
        Ok(report)
    }

    /// Decode the whole tree into the conventional typed layout.
    pub fn typed(&self) -> Result<AppSettings, ConfigError> {
        decode("", self.settings.as_value())
    }

    /// Parsed `log_level`, if present and known.
    pub fn log_level(&self) -> Option<LogLevel> {
        self.settings.get("log_level")?.as_str()?.parse().ok()
    }

    /// Copy of the tree with sensitive fields masked.
    pub fn redacted(&self, policy: &RedactionPolicy) -> Value {
        policy.apply(self.settings.as_value())
    }
}

fn decode<T: DeserializeOwned>(key: &str, value: &Value) -> Result<T, ConfigError> {
    T::deserialize(value).map_err(|source| ConfigError::DecodeFailed {
        key: key.to_string(),
        source,
    })
}
