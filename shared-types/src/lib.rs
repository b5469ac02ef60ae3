use serde::{Deserialize, Serialize};
use std::fmt;

/// In-memory form of a configuration document: string keys mapped to
/// arbitrary (possibly nested) values.
pub type ConfigMap = serde_json::Map<String, serde_json::Value>;

/// Identity of a remotely stored configuration document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    pub container: String,
    pub document: String,
}

impl DocumentKey {
    pub fn new(container: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            document: document.into(),
        }
    }

    /// Generate a path-like string representation
    pub fn to_path(&self) -> String {
        format!("{}/{}", self.container, self.document)
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_path())
    }
}
