//! Version tokens
//!
//! A version token is the identifier of a version record, used wherever the
//! protocol compares "the version I based my edit on" with "the version that
//! is active now". Comparison is by value on the normalized identifier.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::DocumentId;

/// Optimistic-concurrency token naming one version record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(DocumentId);

impl VersionToken {
    /// Wrap a version record id
    pub fn new(id: DocumentId) -> Self {
        Self(id)
    }

    /// Read a token out of a field value
    pub fn from_value(value: &Value) -> Option<Self> {
        DocumentId::from_value(value).map(Self)
    }

    /// The version record id
    pub fn id(&self) -> &DocumentId {
        &self.0
    }

    /// Token as a field value
    pub fn to_value(&self) -> Value {
        self.0.to_value()
    }

    /// True if this token names the given version record
    pub fn names(&self, id: &DocumentId) -> bool {
        &self.0 == id
    }
}

impl From<DocumentId> for VersionToken {
    fn from(id: DocumentId) -> Self {
        Self(id)
    }
}

impl From<&str> for VersionToken {
    fn from(raw: &str) -> Self {
        Self(DocumentId::new(raw))
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
