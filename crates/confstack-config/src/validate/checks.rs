//! The individual validation checks.

use super::{Severity, ValidationCheck, ValidationReport, ValidationRules, ValueKind};
use crate::LogLevel;
use crate::Settings;
use crate::loader::utils::resolve_against;
use crate::settings::join_path;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// 1. Every required key exists.
pub(super) fn check_required_keys(
    settings: &Settings,
    rules: &ValidationRules,
    report: &mut ValidationReport,
) {
    for key in &rules.required_keys {
        if !settings.contains(key) {
            report.error(ValidationCheck::RequiredKeys, key, "missing required key");
        }
    }
}

/// 2. Present values match their expected kinds; the log level is known.
///
/// A null sensitive field is left to the placeholder check.
pub(super) fn check_types(settings: &Settings, rules: &ValidationRules, report: &mut ValidationReport) {
    for rule in &rules.type_rules {
        for (path, value) in settings.resolve_pattern(&rule.key) {
            if value.is_null() && is_sensitive(&path, rules) {
                continue;
            }
            if !rule.expected.matches(value) {
                report.error(
                    ValidationCheck::Types,
                    path,
                    format!("expected {}, found {}", rule.expected, ValueKind::of(value)),
                );
            }
        }
    }

    let Some(key) = rules.log_level_key.as_deref() else {
        return;
    };
    if let Some(Value::String(level)) = settings.get(key) {
        if level.parse::<LogLevel>().is_err() {
            report.error(
                ValidationCheck::Types,
                key,
                format!(
                    "unknown log level '{level}', expected one of: {}",
                    LogLevel::NAMES.join(", ")
                ),
            );
        }
    }
}

/// 3. Sensitive fields hold real values and exist for every cloud domain.
pub(super) fn check_placeholders(
    settings: &Settings,
    rules: &ValidationRules,
    report: &mut ValidationReport,
) {
    if rules.sensitive_fields.is_empty() {
        return;
    }
    let severity = if rules.strict {
        Severity::Error
    } else {
        Severity::Warning
    };
    let fields: Vec<String> = rules
        .sensitive_fields
        .iter()
        .map(|field| field.to_lowercase())
        .collect();

    scan_placeholders(settings.as_value(), "", &fields, rules, severity, report);

    let Some(Value::Object(cloud)) = settings.get(&rules.cloud_section) else {
        return;
    };
    let secrets = section_map(settings, &rules.secrets_section);
    for (entry, details) in cloud {
        let domain = domain_identifier(entry, details);
        for field in &fields {
            let in_secrets = secrets
                .and_then(|secrets| secrets.get(entry))
                .and_then(Value::as_object)
                .is_some_and(|secret| secret.contains_key(field));
            let in_cloud = details
                .as_object()
                .is_some_and(|details| details.contains_key(field));
            if !in_secrets && !in_cloud {
                let key = join_path(&join_path(&rules.secrets_section, entry), field);
                report.push(
                    ValidationCheck::Placeholders,
                    severity,
                    key,
                    format!("missing {field} for domain '{domain}'"),
                );
            }
        }
    }
}

fn scan_placeholders(
    value: &Value,
    path: &str,
    fields: &[String],
    rules: &ValidationRules,
    severity: Severity,
    report: &mut ValidationReport,
) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = join_path(path, key);
                if fields.contains(key) {
                    if let Some(reason) = placeholder_reason(child, rules) {
                        report.push(ValidationCheck::Placeholders, severity, child_path, reason);
                    }
                    continue;
                }
                scan_placeholders(child, &child_path, fields, rules, severity, report);
            }
        }
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                let child_path = join_path(path, &idx.to_string());
                scan_placeholders(item, &child_path, fields, rules, severity, report);
            }
        }
        _ => {}
    }
}

fn placeholder_reason(value: &Value, rules: &ValidationRules) -> Option<String> {
    match value {
        Value::Null => Some("value is missing".to_string()),
        Value::String(text) if text.trim().is_empty() => Some("value is empty".to_string()),
        Value::String(text) => rules
            .placeholder_values
            .iter()
            .find(|placeholder| placeholder.eq_ignore_ascii_case(text.trim()))
            .map(|placeholder| format!("placeholder value '{placeholder}'")),
        _ => None,
    }
}

/// 4. Referenced and required files exist on disk.
pub(super) fn check_files(
    settings: &Settings,
    rules: &ValidationRules,
    base_dir: &Path,
    report: &mut ValidationReport,
) {
    for key in &rules.path_keys {
        for (path, value) in settings.resolve_pattern(key) {
            match value {
                Value::String(raw) => {
                    let resolved = resolve_against(base_dir, Path::new(raw));
                    if !resolved.exists() {
                        report.error(
                            ValidationCheck::Files,
                            path,
                            format!("file not found: {}", resolved.display()),
                        );
                    }
                }
                other => report.error(
                    ValidationCheck::Files,
                    path,
                    format!("expected a path string, found {}", ValueKind::of(other)),
                ),
            }
        }
    }

    for file in &rules.required_files {
        let resolved = resolve_against(base_dir, file);
        if !resolved.exists() {
            report.error(
                ValidationCheck::Files,
                resolved.display().to_string(),
                "required file not found",
            );
        }
    }
}

/// 5. Every database domain has a cloud entry.
pub(super) fn check_domain_matching(
    settings: &Settings,
    rules: &ValidationRules,
    report: &mut ValidationReport,
) {
    let cloud = match domains_in(settings, &rules.cloud_section) {
        Ok(domains) => domains,
        Err(kind) => {
            report.error(
                ValidationCheck::DomainMatching,
                &rules.cloud_section,
                format!("expected mapping, found {kind}"),
            );
            BTreeMap::new()
        }
    };
    let database = match domains_in(settings, &rules.database_section) {
        Ok(domains) => domains,
        Err(kind) => {
            report.error(
                ValidationCheck::DomainMatching,
                &rules.database_section,
                format!("expected mapping, found {kind}"),
            );
            return;
        }
    };

    for (domain, entries) in &database {
        if cloud.contains_key(domain) {
            continue;
        }
        for entry in entries {
            report.error(
                ValidationCheck::DomainMatching,
                join_path(&rules.database_section, entry),
                format!(
                    "domain '{domain}' has no entry under {}",
                    rules.cloud_section
                ),
            );
        }
    }
}

/// 6. Every required domain is configured under the database section.
pub(super) fn check_domain_presence(
    settings: &Settings,
    rules: &ValidationRules,
    report: &mut ValidationReport,
) {
    if rules.required_domains.is_empty() {
        return;
    }
    let database = domains_in(settings, &rules.database_section).unwrap_or_default();
    for domain in &rules.required_domains {
        let normalized = domain.trim().to_lowercase();
        if !database.contains_key(&normalized) {
            report.error(
                ValidationCheck::DomainPresence,
                join_path(&rules.database_section, &normalized),
                format!(
                    "no {} config for domain '{domain}'",
                    rules.database_section
                ),
            );
        }
    }
}

fn is_sensitive(path: &str, rules: &ValidationRules) -> bool {
    let field = path.rsplit('.').next().unwrap_or(path);
    rules
        .sensitive_fields
        .iter()
        .any(|sensitive| sensitive.eq_ignore_ascii_case(field))
}

fn section_map<'a>(settings: &'a Settings, section: &str) -> Option<&'a Map<String, Value>> {
    settings.get(section).and_then(Value::as_object)
}

/// Domain identifiers in a section, mapped to every entry key that declares them.
///
/// An absent section has no domains; a non-mapping section reports its kind.
pub(super) fn domains_in(
    settings: &Settings,
    section: &str,
) -> Result<BTreeMap<String, Vec<String>>, ValueKind> {
    match settings.get(section) {
        None | Some(Value::Null) => Ok(BTreeMap::new()),
        Some(Value::Object(entries)) => {
            let mut domains: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for (entry, details) in entries {
                domains
                    .entry(domain_identifier(entry, details))
                    .or_default()
                    .push(entry.clone());
            }
            Ok(domains)
        }
        Some(other) => Err(ValueKind::of(other)),
    }
}

/// An entry's `domain` field when it is a string, else the entry key.
fn domain_identifier(entry: &str, details: &Value) -> String {
    details
        .get("domain")
        .and_then(Value::as_str)
        .map(|domain| domain.trim().to_lowercase())
        .filter(|domain| !domain.is_empty())
        .unwrap_or_else(|| entry.to_string())
}
