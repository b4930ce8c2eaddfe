//! Environment-variable overrides applied on top of the file layers.

use super::{layer_io, merge};
use log::debug;
use serde_json::Value;

/// Nesting separator inside override variable names.
const NESTING_SEPARATOR: &str = "__";
/// Suffixes of variables that configure the loader itself.
const RESERVED_SUFFIXES: &[&str] = &["ENV", "CONFIG_DIR"];

/// Apply `PREFIX_A__B=value` style overrides to the tree.
///
/// Returns the dotted keys that were overridden. Loader variables such as
/// `PREFIX_ENV` and `PREFIX_CONFIG_DIR` are skipped.
pub(super) fn apply_env_overrides<I>(root: &mut Value, prefix: &str, vars: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let prefix = format!("{}_", prefix.trim_end_matches('_').to_uppercase());
    let mut applied = Vec::new();

    let mut candidates: Vec<(String, String)> = vars
        .into_iter()
        .filter(|(name, _)| {
            let upper = name.to_uppercase();
            upper
                .strip_prefix(&prefix)
                .is_some_and(|rest| !RESERVED_SUFFIXES.contains(&rest))
        })
        .collect();
    // Deterministic order when two variables touch the same path.
    candidates.sort();

    for (name, raw) in candidates {
        let Some(segments) = name.get(prefix.len()..).and_then(override_segments) else {
            debug!("ignoring malformed override variable: {name}");
            continue;
        };
        let key = segments.join(".");
        let overlay = merge::nest(&segments, parse_override_value(&raw));
        merge::merge_json_values(root, &overlay);
        debug!("applied environment override (var={name}, key={key})");
        applied.push(key);
    }
    applied
}

fn override_segments(rest: &str) -> Option<Vec<String>> {
    let segments: Vec<String> = rest
        .split(NESTING_SEPARATOR)
        .map(str::to_lowercase)
        .collect();
    if segments.iter().any(String::is_empty) {
        return None;
    }
    Some(segments)
}

/// Interpret an override as a YAML scalar, falling back to the raw string.
pub(super) fn parse_override_value(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::String(raw.to_string());
    }
    match serde_yaml::from_str::<serde_yaml::Value>(raw) {
        Ok(parsed) => match layer_io::yaml_to_json(parsed) {
            Value::Object(_) | Value::Array(_) => Value::String(raw.to_string()),
            scalar => scalar,
        },
        Err(_) => Value::String(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn overrides_nested_values_with_typed_scalars() {
        let mut root = json!({ "database": { "sample": { "host": "db", "port": 5432 } } });
        let applied = apply_env_overrides(
            &mut root,
            "CONFSTACK",
            vars(&[
                ("CONFSTACK_DATABASE__SAMPLE__PORT", "6543"),
                ("CONFSTACK_FEATURES__ENABLE_X", "true"),
                ("OTHER_LOG_LEVEL", "debug"),
            ]),
        );
        assert_eq!(
            applied,
            vec!["database.sample.port".to_string(), "features.enable_x".to_string()]
        );
        assert_eq!(
            root,
            json!({
                "database": { "sample": { "host": "db", "port": 6543 } },
                "features": { "enable_x": true }
            })
        );
    }

    #[test]
    fn loader_variables_are_not_overrides() {
        let mut root = json!({});
        let applied = apply_env_overrides(
            &mut root,
            "CONFSTACK",
            vars(&[
                ("CONFSTACK_ENV", "production"),
                ("CONFSTACK_CONFIG_DIR", "/etc/app"),
            ]),
        );
        assert!(applied.is_empty());
        assert_eq!(root, json!({}));
    }

    #[test]
    fn malformed_names_are_ignored() {
        let mut root = json!({});
        let applied = apply_env_overrides(
            &mut root,
            "CONFSTACK",
            vars(&[("CONFSTACK_A____B", "1"), ("CONFSTACK_", "1")]),
        );
        assert!(applied.is_empty());
    }

    #[test]
    fn structured_values_stay_strings() {
        assert_eq!(parse_override_value("a: b"), json!("a: b"));
        assert_eq!(parse_override_value("[1, 2]"), json!("[1, 2]"));
        assert_eq!(parse_override_value("1.5"), json!(1.5));
        assert_eq!(parse_override_value(""), json!(""));
        assert_eq!(parse_override_value("REPLACE_ME"), json!("REPLACE_ME"));
    }
}
