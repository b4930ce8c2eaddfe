//! Typed view of the conventional settings layout.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Root settings for an app/cloud/database/secrets stack.
///
/// Unknown top-level keys are kept in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppSettings {
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub model_type: Option<String>,
    #[serde(default)]
    pub secrets_file: Option<String>,
    #[serde(default)]
    pub features: BTreeMap<String, bool>,
    #[serde(default)]
    pub cloud_details: BTreeMap<String, CloudDetails>,
    #[serde(default)]
    pub cloud_secrets: BTreeMap<String, CloudSecrets>,
    #[serde(default)]
    pub database: BTreeMap<String, DatabaseDetails>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppSettings {
    /// Parsed `log_level`, when present and known.
    pub fn log_level(&self) -> Option<LogLevel> {
        self.log_level.as_deref()?.parse().ok()
    }

    /// Whether a feature flag is set; absent flags are off.
    pub fn feature_enabled(&self, name: &str) -> bool {
        self.features
            .get(&name.to_lowercase())
            .copied()
            .unwrap_or(false)
    }

    /// The API key for a domain, preferring the secrets section.
    pub fn api_key(&self, domain: &str) -> Option<&str> {
        let domain = domain.to_lowercase();
        self.cloud_secrets
            .get(&domain)
            .and_then(|secrets| secrets.api_key.as_deref())
            .or_else(|| {
                self.cloud_details
                    .get(&domain)
                    .and_then(|details| details.api_key.as_deref())
            })
    }
}

/// Cloud provider details for one domain.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CloudDetails {
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Secrets for one domain.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CloudSecrets {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Database connection details for one domain.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DatabaseDetails {
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Severity named by the `log_level` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// A `log_level` value that names no known severity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown log level: {0}")]
pub struct UnknownLogLevel(pub String);

impl LogLevel {
    /// Accepted spellings, case-insensitive.
    pub const NAMES: &'static [&'static str] = &[
        "trace", "debug", "info", "warn", "warning", "error", "critical",
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = UnknownLogLevel;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" | "critical" => Ok(Self::Error),
            _ => Err(UnknownLogLevel(value.to_string())),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn log_level_accepts_warning_and_critical() {
        assert_eq!("WARNING".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!("Critical".parse::<LogLevel>(), Ok(LogLevel::Error));
        assert_eq!(" info ".parse::<LogLevel>(), Ok(LogLevel::Info));
        assert!("verbose".parse::<LogLevel>().is_err());
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
    }

    #[test]
    fn app_settings_keeps_unknown_fields() {
        let settings: AppSettings = serde_json::from_value(json!({
            "log_level": "debug",
            "features": { "enable_feature_x": true },
            "cloud_details": {
                "sample_domain": { "provider": "aws", "region": "us-east-1", "tier": "gold" }
            },
            "cloud_secrets": { "sample_domain": { "api_key": "sk-live-0123456789" } },
            "database": { "sample_domain": { "host": "db", "port": 5432 } },
            "owner": "platform"
        }))
        .expect("decode");

        assert_eq!(settings.log_level(), Some(LogLevel::Debug));
        assert!(settings.feature_enabled("ENABLE_FEATURE_X"));
        assert!(!settings.feature_enabled("missing"));
        assert_eq!(settings.api_key("sample_domain"), Some("sk-live-0123456789"));
        assert_eq!(settings.database["sample_domain"].port, Some(5432));
        assert_eq!(
            settings.cloud_details["sample_domain"].extra.get("tier"),
            Some(&json!("gold"))
        );
        assert_eq!(settings.extra.get("owner"), Some(&json!("platform")));
    }
}
