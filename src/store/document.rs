//! Document and identifier types shared by every collection
//!
//! A document is an optional identifier plus a flat map of top-level fields.
//! The identifier is kept outside the field map; `_id` never appears in
//! `fields`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Name of the primary identifier field in every schema.
pub const ID_FIELD: &str = "_id";

/// Top-level field map of a document.
pub type Fields = Map<String, Value>;

/// Canonical document identifier.
///
/// Identifiers that parse as UUIDs are normalized to their lowercase
/// hyphenated form, so the same id always compares equal regardless of how a
/// driver rendered it. Any other string is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Creates an identifier, normalizing UUID-shaped input.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        match Uuid::parse_str(raw.trim()) {
            Ok(uuid) => Self(uuid.hyphenated().to_string()),
            Err(_) => Self(raw),
        }
    }

    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    /// Reads an identifier out of a field value.
    ///
    /// Only strings carry identifiers; null, numbers and objects yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self::new(s.as_str())),
            _ => None,
        }
    }

    /// Returns the identifier as a field value.
    pub fn to_value(&self) -> Value {
        Value::String(self.0.clone())
    }

    /// Returns the canonical string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for DocumentId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

/// A raw document as exchanged with a [`DocumentStore`](super::DocumentStore).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    /// Identifier, assigned by the store on first insert when absent.
    pub id: Option<DocumentId>,
    /// Top-level fields, excluding the identifier.
    pub fields: Fields,
}

impl Document {
    /// Creates an unsaved document from its fields.
    pub fn new(fields: Fields) -> Self {
        Self { id: None, fields }
    }

    /// Creates a document with a known identifier.
    pub fn with_id(id: DocumentId, fields: Fields) -> Self {
        Self {
            id: Some(id),
            fields,
        }
    }

    /// Returns a field value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Sets a field value. Writing `_id` sets the identifier instead.
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        let field = field.into();
        if field == ID_FIELD {
            self.id = DocumentId::from_value(&value);
            return;
        }
        self.fields.insert(field, value);
    }

    /// Removes a field, returning its previous value.
    pub fn unset(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Reads a field as an identifier.
    pub fn id_field(&self, field: &str) -> Option<DocumentId> {
        self.fields.get(field).and_then(DocumentId::from_value)
    }

    /// Renders the document as a single JSON object including `_id`.
    pub fn to_json(&self) -> Value {
        let mut object = self.fields.clone();
        if let Some(id) = &self.id {
            object.insert(ID_FIELD.to_string(), id.to_value());
        }
        Value::Object(object)
    }

    /// Builds a document from a JSON object, lifting `_id` out of the fields.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(mut fields) => {
                let id = fields
                    .remove(ID_FIELD)
                    .as_ref()
                    .and_then(DocumentId::from_value);
                Some(Self { id, fields })
            }
            _ => None,
        }
    }
}
