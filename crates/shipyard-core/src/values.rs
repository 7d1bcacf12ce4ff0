//! Values documents
//!
//! A release carries its chart configuration as a free-form YAML mapping.
//! `Values` keeps that mapping in source key order, which matters: container
//! discovery reports containers in the order their keys appear.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::error::{CoreError, Result};

/// Ordered values mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(pub Mapping);

impl Values {
    /// Create empty values
    pub fn new() -> Self {
        Self(Mapping::new())
    }

    /// Parse values from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Wrap an already decoded value. `null` (an empty `values:` key) is
    /// treated as an empty mapping; anything else that is not a mapping is
    /// rejected.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Mapping(map) => Ok(Self(map)),
            Value::Null => Ok(Self::new()),
            other => Err(CoreError::InvalidValues {
                message: format!("expected a mapping, found {}", type_name(&other)),
            }),
        }
    }

    /// Get a value by dotted path (e.g., "db.image.tag")
    pub fn get(&self, path: &str) -> Option<&Value> {
        let parts: Vec<&str> = path.split('.').collect();
        self.get_path(&parts)
    }

    /// Get a value by key path, for keys that may themselves contain dots
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        get_nested(&self.0, path)
    }

    /// Top-level string field
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Top-level mapping field
    pub fn get_mapping(&self, key: &str) -> Option<&Mapping> {
        self.0.get(key).and_then(Value::as_mapping)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// String keys in document order. Non-string keys (`1: x`, `? [a]`) are
    /// not addressable by name and are left out.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries().map(|(k, _)| k)
    }

    /// String-keyed entries in document order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        string_entries(&self.0)
    }

    pub fn as_mapping(&self) -> &Mapping {
        &self.0
    }

    pub fn into_inner(self) -> Mapping {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// String-keyed entries of any mapping, in document order
pub fn string_entries(map: &Mapping) -> impl Iterator<Item = (&str, &Value)> {
    map.iter().filter_map(|(k, v)| k.as_str().map(|k| (k, v)))
}

/// Short name of a value's type, for error messages
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

fn get_nested<'a, S: AsRef<str>>(map: &'a Mapping, path: &[S]) -> Option<&'a Value> {
    let (key, remaining) = path.split_first()?;
    let value = map.get(key.as_ref())?;

    if remaining.is_empty() {
        return Some(value);
    }

    match value {
        Value::Mapping(inner) => get_nested(inner, remaining),
        _ => None,
    }
}
