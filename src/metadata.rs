use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// a single front-matter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Bool(bool),
    Text(String),
}

impl MetaValue {
    /// booleans and the usual spellings of yes
    pub fn is_truthy(&self) -> bool {
        match self {
            MetaValue::Bool(b) => *b,
            MetaValue::Text(s) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "true" | "yes" | "on" | "1"
            ),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) => Some(s),
            MetaValue::Bool(_) => None,
        }
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        Self::Text(value.into())
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// the metadata associated with a page
///
/// ordered so that anything rendered from it is stable between runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, MetaValue>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetaValue)> {
        self.0.iter()
    }

    /// an explicitly given, non-empty title
    pub fn title(&self) -> Option<&str> {
        self.get("title")
            .and_then(MetaValue::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// drafts are never rendered
    pub fn is_draft(&self) -> bool {
        self.get("draft").is_some_and(MetaValue::is_truthy)
    }
}
