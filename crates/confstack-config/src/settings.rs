//! In-memory settings tree with dotted-path access.

use crate::ConfigError;
use serde_json::{Map, Value};

/// Merged settings, keyed case-insensitively.
///
/// Keys are stored lower-cased; every lookup path is lower-cased before it is
/// resolved, so `Cloud_Details.Sample` and `cloud_details.sample` address the
/// same entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    root: Value,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }
}

impl Settings {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a mapping, normalizing its keys.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self {
            root: normalize_keys(Value::Object(map)),
        }
    }

    /// Build a tree from an arbitrary value; non-mappings yield `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self::from_map(map)),
            _ => None,
        }
    }

    /// Resolve a dotted path. An empty path addresses the whole tree.
    ///
    /// Numeric segments index into sequences.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut current = &self.root;
        for segment in path_segments(key) {
            current = match current {
                Value::Object(map) => map.get(&segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// True when the path resolves to a value (including null).
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Top-level entries.
    pub fn as_map(&self) -> &Map<String, Value> {
        match &self.root {
            Value::Object(map) => map,
            _ => unreachable!("settings root is always a mapping"),
        }
    }

    /// The whole tree as a value.
    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// Write a value at a dotted path, creating intermediate mappings.
    pub(crate) fn set(&mut self, key: &str, value: Value) -> Result<(), ConfigError> {
        let segments = path_segments(key);
        let Some((last, parents)) = segments.split_last() else {
            return Err(invalid_path(key, "key is empty"));
        };

        let mut current = &mut self.root;
        for segment in parents {
            let Value::Object(map) = current else {
                return Err(invalid_path(key, "parent is not a mapping"));
            };
            let entry = map
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                return Err(invalid_path(
                    key,
                    &format!("segment '{segment}' is not a mapping"),
                ));
            }
            current = entry;
        }

        let Value::Object(map) = current else {
            return Err(invalid_path(key, "parent is not a mapping"));
        };
        map.insert(last.clone(), normalize_keys(value));
        Ok(())
    }

    /// Expand a pattern whose `*` segments match every child of a mapping.
    ///
    /// Returns the concrete dotted path of each match together with its value.
    pub(crate) fn resolve_pattern(&self, pattern: &str) -> Vec<(String, &Value)> {
        let segments = path_segments(pattern);
        let mut matches = Vec::new();
        collect_matches(&self.root, &segments, String::new(), &mut matches);
        matches
    }
}

fn collect_matches<'a>(
    value: &'a Value,
    segments: &[String],
    prefix: String,
    out: &mut Vec<(String, &'a Value)>,
) {
    let Some((head, rest)) = segments.split_first() else {
        out.push((prefix, value));
        return;
    };
    let Value::Object(map) = value else {
        return;
    };
    if head == "*" {
        for (key, child) in map {
            collect_matches(child, rest, join_path(&prefix, key), out);
        }
    } else if let Some(child) = map.get(head) {
        collect_matches(child, rest, join_path(&prefix, head), out);
    }
}

/// Split a dotted key into lower-cased, non-empty segments.
pub(crate) fn path_segments(key: &str) -> Vec<String> {
    key.split('.')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Join nested paths for messages and pattern expansion.
pub(crate) fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Lower-case every mapping key, recursively.
pub(crate) fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut normalized = Map::with_capacity(map.len());
            for (key, value) in map {
                normalized.insert(key.to_lowercase(), normalize_keys(value));
            }
            Value::Object(normalized)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_keys).collect()),
        value => value,
    }
}

fn invalid_path(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidPath {
        key: key.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> Settings {
        let Value::Object(map) = json!({
            "Cloud_Details": {
                "Sample_Domain": { "provider": "aws", "regions": ["us-east-1", "eu-west-1"] }
            },
            "log_level": "INFO"
        }) else {
            unreachable!()
        };
        Settings::from_map(map)
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let settings = sample();
        assert_eq!(
            settings.get("CLOUD_DETAILS.sample_domain.Provider"),
            Some(&json!("aws"))
        );
        assert!(settings.contains("cloud_details.sample_domain"));
    }

    #[test]
    fn numeric_segments_index_sequences() {
        let settings = sample();
        assert_eq!(
            settings.get("cloud_details.sample_domain.regions.1"),
            Some(&json!("eu-west-1"))
        );
        assert_eq!(settings.get("cloud_details.sample_domain.regions.9"), None);
    }

    #[test]
    fn lookup_through_scalar_is_absent() {
        let settings = sample();
        assert_eq!(settings.get("log_level.inner"), None);
    }

    #[test]
    fn empty_key_addresses_root() {
        let settings = sample();
        assert!(settings.get("").is_some_and(Value::is_object));
    }

    #[test]
    fn set_creates_intermediate_mappings() {
        let mut settings = Settings::new();
        settings
            .set("Database.Primary.Port", json!(5432))
            .expect("set");
        assert_eq!(settings.get("database.primary.port"), Some(&json!(5432)));
    }

    #[test]
    fn set_rejects_scalar_parent() {
        let mut settings = sample();
        let err = settings
            .set("log_level.nested", json!(1))
            .expect_err("scalar parent");
        assert!(matches!(err, ConfigError::InvalidPath { .. }));
    }

    #[test]
    fn set_rejects_empty_key() {
        let mut settings = Settings::new();
        assert!(settings.set(" . ", json!(1)).is_err());
    }

    #[test]
    fn wildcard_patterns_expand_children() {
        let Value::Object(map) = json!({
            "database": {
                "a": { "port": 1 },
                "b": { "port": 2 },
                "c": "not a mapping"
            }
        }) else {
            unreachable!()
        };
        let settings = Settings::from_map(map);
        let matches = settings.resolve_pattern("database.*.port");
        let paths: Vec<_> = matches.iter().map(|(path, _)| path.as_str()).collect();
        assert_eq!(paths, vec!["database.a.port", "database.b.port"]);
    }
}
