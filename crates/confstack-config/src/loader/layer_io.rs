//! IO helpers for reading YAML config layers from disk.

use crate::ConfigError;
use log::debug;
use serde_json::{Map, Number, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Read one YAML file into a key-normalized mapping.
///
/// An empty document yields `None`; any other non-mapping document is an
/// error.
pub(super) fn read_layer(path: &Path) -> Result<Option<Map<String, Value>>, ConfigError> {
    debug!("reading config layer (path={})", path.display());
    let contents = fs::read_to_string(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
        _ => ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source: err,
        },
    })?;
    let document: serde_yaml::Value =
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            source,
        })?;

    match yaml_to_json(document) {
        Value::Null => {
            debug!("config layer is empty (path={})", path.display());
            Ok(None)
        }
        Value::Object(map) => Ok(Some(map)),
        _ => Err(ConfigError::NotAMapping {
            path: path.to_path_buf(),
            section: "document root".to_string(),
        }),
    }
}

/// Convert a YAML value into the JSON tree used for merging.
///
/// Mapping keys are lower-cased and non-string keys are rendered as text.
/// Tags are dropped in favour of the tagged value.
pub(super) fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(flag) => Value::Bool(flag),
        serde_yaml::Value::Number(number) => yaml_number(&number),
        serde_yaml::Value::String(text) => Value::String(text),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                map.insert(yaml_key(&key).to_lowercase(), yaml_to_json(value));
            }
            Value::Object(map)
        }
        serde_yaml::Value::Tagged(tagged) => {
            let tagged = *tagged;
            yaml_to_json(tagged.value)
        }
    }
}

fn yaml_number(number: &serde_yaml::Number) -> Value {
    if let Some(value) = number.as_i64() {
        Value::Number(value.into())
    } else if let Some(value) = number.as_u64() {
        Value::Number(value.into())
    } else {
        number
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            // .nan and .inf have no JSON representation
            .unwrap_or_else(|| Value::String(number.to_string()))
    }
}

fn yaml_key(key: &serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(text) => text.clone(),
        serde_yaml::Value::Number(number) => number.to_string(),
        serde_yaml::Value::Bool(flag) => flag.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        serde_yaml::Value::Tagged(tagged) => yaml_key(&tagged.value),
        other => serde_yaml::to_string(other)
            .map(|text| text.trim().to_string())
            .unwrap_or_default(),
    }
}
