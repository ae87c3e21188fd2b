use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionValue {
    Number(f64),
    Text(String),
}

/// Per-session key/value state carried between reruns of the tracker form.
///
/// The context is owned by the caller and handed to whatever needs it; it is
/// never stored globally and the projection engine never sees it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionContext {
    values: BTreeMap<String, SessionValue>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Numeric value under `key`, or `default` when absent or not a number.
    pub fn get_number(&self, key: &str, default: f64) -> f64 {
        match self.values.get(key) {
            Some(SessionValue::Number(v)) => *v,
            _ => default,
        }
    }

    pub fn get_text<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        match self.values.get(key) {
            Some(SessionValue::Text(v)) => v.as_str(),
            _ => default,
        }
    }

    pub fn set_number(&mut self, key: impl Into<String>, value: f64) {
        self.values.insert(key.into(), SessionValue::Number(value));
    }

    pub fn set_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), SessionValue::Text(value.into()));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
