//! Validation rules and reporting for merged settings.
//!
//! Six checks run in a fixed order and every failure is collected before the
//! caller decides what to do: required keys, value types, placeholder
//! secrets, referenced files, database/cloud domain matching, and required
//! domain presence.

mod checks;


use crate::Settings;
use log::warn;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};

/// Default sentinel for an unsupplied secret.
pub const DEFAULT_PLACEHOLDER: &str = "REPLACE_ME";

/// Primitive kinds a config value can be checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Integer,
    /// Any number; integers are accepted.
    Float,
    Boolean,
    Mapping,
    Sequence,
    Null,
}

impl ValueKind {
    /// Kind of a concrete value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(number) if number.is_f64() => Self::Float,
            Value::Number(_) => Self::Integer,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Sequence,
            Value::Object(_) => Self::Mapping,
        }
    }

    /// Whether `value` satisfies this kind.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::Float => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            kind => Self::of(value) == kind,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Mapping => "mapping",
            Self::Sequence => "sequence",
            Self::Null => "null",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected kind for a dotted key; `*` segments match every child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRule {
    pub key: String,
    pub expected: ValueKind,
}

impl TypeRule {
    pub fn new(key: impl Into<String>, expected: ValueKind) -> Self {
        Self {
            key: key.into(),
            expected,
        }
    }
}

/// Everything the validator checks, with the conventional defaults.
#[derive(Debug, Clone)]
pub struct ValidationRules {
    /// Dotted keys that must exist.
    pub required_keys: Vec<String>,
    /// Expected kinds for present keys.
    pub type_rules: Vec<TypeRule>,
    /// Key holding the log severity name; checked against known levels.
    pub log_level_key: Option<String>,
    /// Field names treated as secrets.
    pub sensitive_fields: Vec<String>,
    /// Values meaning "secret not supplied".
    pub placeholder_values: Vec<String>,
    /// Escalate placeholder findings from warnings to errors.
    pub strict: bool,
    /// Dotted keys whose string values are paths that must exist.
    pub path_keys: Vec<String>,
    /// Files that must exist regardless of config contents.
    pub required_files: Vec<PathBuf>,
    /// Section holding per-domain cloud details.
    pub cloud_section: String,
    /// Section holding per-domain secrets.
    pub secrets_section: String,
    /// Section holding per-domain database details.
    pub database_section: String,
    /// Domains that must be configured under the database section.
    pub required_domains: Vec<String>,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            required_keys: strings(&["cloud_details", "database", "log_level"]),
            type_rules: vec![
                TypeRule::new("log_level", ValueKind::String),
                TypeRule::new("model_type", ValueKind::String),
                TypeRule::new("cloud_details.*.provider", ValueKind::String),
                TypeRule::new("database.*.port", ValueKind::Integer),
                TypeRule::new("features.*", ValueKind::Boolean),
                TypeRule::new("cloud_secrets.*.api_key", ValueKind::String),
            ],
            log_level_key: Some("log_level".to_string()),
            sensitive_fields: strings(&["api_key"]),
            placeholder_values: strings(&[DEFAULT_PLACEHOLDER]),
            strict: false,
            path_keys: strings(&["secrets_file"]),
            required_files: Vec::new(),
            cloud_section: "cloud_details".to_string(),
            secrets_section: "cloud_secrets".to_string(),
            database_section: "database".to_string(),
            required_domains: Vec::new(),
        }
    }
}

impl ValidationRules {
    /// Rules with no checks configured beyond the section names.
    pub fn empty() -> Self {
        Self {
            required_keys: Vec::new(),
            type_rules: Vec::new(),
            log_level_key: None,
            sensitive_fields: Vec::new(),
            placeholder_values: Vec::new(),
            path_keys: Vec::new(),
            ..Self::default()
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn require_key(mut self, key: impl Into<String>) -> Self {
        self.required_keys.push(key.into());
        self
    }

    pub fn require_type(mut self, key: impl Into<String>, expected: ValueKind) -> Self {
        self.type_rules.push(TypeRule::new(key, expected));
        self
    }

    pub fn require_file(mut self, path: impl AsRef<Path>) -> Self {
        self.required_files.push(path.as_ref().to_path_buf());
        self
    }

    pub fn require_domain(mut self, domain: impl Into<String>) -> Self {
        self.required_domains.push(domain.into());
        self
    }

    pub fn sensitive_field(mut self, field: impl Into<String>) -> Self {
        self.sensitive_fields.push(field.into());
        self
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

/// The check that produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationCheck {
    RequiredKeys,
    Types,
    Placeholders,
    Files,
    DomainMatching,
    DomainPresence,
}

impl ValidationCheck {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RequiredKeys => "required-keys",
            Self::Types => "types",
            Self::Placeholders => "placeholders",
            Self::Files => "files",
            Self::DomainMatching => "domain-matching",
            Self::DomainPresence => "domain-presence",
        }
    }
}

impl fmt::Display for ValidationCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// One problem found by a check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFinding {
    pub check: ValidationCheck,
    pub severity: Severity,
    /// Dotted key (or file path) the finding is about.
    pub key: String,
    pub message: String,
}

impl fmt::Display for ValidationFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.check, self.key, self.message)
    }
}

/// All findings from one validation pass, in check order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    findings: Vec<ValidationFinding>,
}

impl ValidationReport {
    pub fn findings(&self) -> &[ValidationFinding] {
        &self.findings
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationFinding> {
        self.findings
            .iter()
            .filter(|finding| finding.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationFinding> {
        self.findings
            .iter()
            .filter(|finding| finding.severity == Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// True when a finding from `check` mentions `needle` in its key or message.
    pub fn mentions(&self, check: ValidationCheck, needle: &str) -> bool {
        self.findings.iter().any(|finding| {
            finding.check == check
                && (finding.key.contains(needle) || finding.message.contains(needle))
        })
    }

    /// Emit every warning through the `log` facade.
    pub fn log_warnings(&self) {
        for finding in self.warnings() {
            warn!("{finding}");
        }
    }

    pub(crate) fn push(
        &mut self,
        check: ValidationCheck,
        severity: Severity,
        key: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.findings.push(ValidationFinding {
            check,
            severity,
            key: key.into(),
            message: message.into(),
        });
    }

    pub(crate) fn error(
        &mut self,
        check: ValidationCheck,
        key: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.push(check, Severity::Error, key, message);
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, finding) in self.findings.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            let label = match finding.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            };
            write!(f, "{label}: {finding}")?;
        }
        Ok(())
    }
}

/// Run every check against `settings` and collect the findings.
///
/// Relative file paths resolve against `base_dir`. Nothing is logged here;
/// callers decide how to surface warnings.
pub fn validate_settings(
    settings: &Settings,
    rules: &ValidationRules,
    base_dir: &Path,
) -> ValidationReport {
    let mut report = ValidationReport::default();
    checks::check_required_keys(settings, rules, &mut report);
    checks::check_types(settings, rules, &mut report);
    checks::check_placeholders(settings, rules, &mut report);
    checks::check_files(settings, rules, base_dir, &mut report);
    checks::check_domain_matching(settings, rules, &mut report);
    checks::check_domain_presence(settings, rules, &mut report);
    report
}
