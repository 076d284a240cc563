use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

/// Variable metadata supplied by the host statistics engine. Every lookup has
/// a "no metadata" answer; none of them fail.
pub trait Metadata {
    fn display_label(&self, name: &str) -> Option<&str>;
    fn value_label(&self, name: &str, level: i64) -> Option<&str>;
    fn has_value_labels(&self, name: &str) -> bool;
    fn display_format(&self, name: &str) -> Option<&str>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetadata;

impl Metadata for NoMetadata {
    fn display_label(&self, _name: &str) -> Option<&str> {
        None
    }

    fn value_label(&self, _name: &str, _level: i64) -> Option<&str> {
        None
    }

    fn has_value_labels(&self, _name: &str) -> bool {
        false
    }

    fn display_format(&self, _name: &str) -> Option<&str> {
        None
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VariableInfo {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub value_labels: Option<BTreeMap<i64, String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VariableCatalog {
    #[serde(default)]
    pub variables: HashMap<String, VariableInfo>,
}

impl VariableCatalog {
    fn get(&self, name: &str) -> Option<&VariableInfo> {
        self.variables
            .get(name)
            .or_else(|| self.variables.get(&name.to_lowercase()))
    }
}

impl Metadata for VariableCatalog {
    fn display_label(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|v| v.label.as_deref())
            .filter(|l| !l.trim().is_empty())
    }

    fn value_label(&self, name: &str, level: i64) -> Option<&str> {
        self.get(name)
            .and_then(|v| v.value_labels.as_ref())
            .and_then(|set| set.get(&level))
            .map(String::as_str)
    }

    fn has_value_labels(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| v.value_labels.is_some())
    }

    fn display_format(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|v| v.format.as_deref())
            .filter(|f| !f.trim().is_empty())
    }
}
