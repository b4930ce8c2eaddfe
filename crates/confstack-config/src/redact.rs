//! Redaction of sensitive fields before settings are displayed.

use serde_json::Value;

/// Default replacement marker for redacted fields.
pub const DEFAULT_REPLACEMENT: &str = "[REDACTED]";

/// Policy that masks sensitive fields in a settings tree.
#[derive(Debug, Clone)]
pub struct RedactionPolicy {
    /// Key names whose values are masked, case-insensitive.
    pub redact_keys: Vec<String>,
    /// Replacement text for masked values.
    pub replacement: String,
}

impl Default for RedactionPolicy {
    fn default() -> Self {
        Self {
            redact_keys: vec!["api_key".to_string()],
            replacement: DEFAULT_REPLACEMENT.to_string(),
        }
    }
}

impl RedactionPolicy {
    /// Policy masking exactly `keys`.
    pub fn for_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            redact_keys: keys.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Apply the policy to a value, returning the masked copy.
    pub fn apply(&self, value: &Value) -> Value {
        match value {
            Value::Array(values) => {
                Value::Array(values.iter().map(|value| self.apply(value)).collect())
            }
            Value::Object(values) => {
                let mut masked = serde_json::Map::with_capacity(values.len());
                for (key, value) in values {
                    let value = if self.should_redact_key(key) && !value.is_null() {
                        Value::String(self.replacement.clone())
                    } else {
                        self.apply(value)
                    };
                    masked.insert(key.clone(), value);
                }
                Value::Object(masked)
            }
            value => value.clone(),
        }
    }

    fn should_redact_key(&self, key: &str) -> bool {
        self.redact_keys
            .iter()
            .any(|entry| entry.eq_ignore_ascii_case(key))
    }
}
