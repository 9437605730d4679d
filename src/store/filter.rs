//! Filters and patches understood by every document store
//!
//! Filters are conjunctions of an optional identifier match and top-level
//! field equality. Equality against `null` also matches an absent field.

use serde_json::Value;

use super::document::{Document, DocumentId, Fields};

/// Conjunctive equality filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    id: Option<DocumentId>,
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// Creates a filter that matches every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filter matching a single identifier.
    pub fn by_id(id: DocumentId) -> Self {
        Self {
            id: Some(id),
            conditions: Vec::new(),
        }
    }

    /// Adds a field equality condition.
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    /// Evaluates the filter against a document.
    pub fn matches(&self, doc: &Document) -> bool {
        if let Some(id) = &self.id {
            if doc.id.as_ref() != Some(id) {
                return false;
            }
        }

        self.conditions.iter().all(|(field, expected)| {
            match doc.get(field) {
                Some(actual) => values_equal(actual, expected),
                None => expected.is_null(),
            }
        })
    }

    /// Builds the document an upsert inserts when nothing matched.
    ///
    /// The new document carries the filter's id (if any) and every non-null
    /// equality condition as a field.
    pub fn seed_document(&self) -> Document {
        let mut doc = Document {
            id: self.id.clone(),
            fields: Fields::new(),
        };
        for (field, value) in &self.conditions {
            if !value.is_null() {
                doc.set(field.clone(), value.clone());
            }
        }
        doc
    }
}

/// Equality with identifier normalization for string values.
fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::String(a), Value::String(b)) => {
            DocumentId::new(a.as_str()) == DocumentId::new(b.as_str())
        }
        _ => actual == expected,
    }
}

/// Field modifications applied by a conditional update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    /// Fields written on every match or insert.
    pub set: Fields,
    /// Fields written only when the update inserts.
    pub set_on_insert: Fields,
    /// Fields removed on match.
    pub unset: Vec<String>,
}

impl Patch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a field on every match.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.insert(field.into(), value.into());
        self
    }

    /// Writes every field of a map on every match.
    pub fn set_all(mut self, fields: Fields) -> Self {
        self.set.extend(fields);
        self
    }

    /// Writes a field only when inserting.
    pub fn set_on_insert(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_on_insert.insert(field.into(), value.into());
        self
    }

    /// Writes every field of a map only when inserting.
    pub fn set_all_on_insert(mut self, fields: Fields) -> Self {
        self.set_on_insert.extend(fields);
        self
    }

    /// Removes a field on match.
    pub fn unset(mut self, field: impl Into<String>) -> Self {
        self.unset.push(field.into());
        self
    }

    /// Applies the patch to a matched document.
    pub fn apply(&self, doc: &mut Document) {
        for field in &self.unset {
            doc.unset(field);
        }
        for (field, value) in &self.set {
            doc.set(field.clone(), value.clone());
        }
    }

    /// Applies the patch to a freshly seeded upsert document.
    pub fn apply_on_insert(&self, doc: &mut Document) {
        for (field, value) in &self.set_on_insert {
            doc.set(field.clone(), value.clone());
        }
        for (field, value) in &self.set {
            doc.set(field.clone(), value.clone());
        }
    }
}

/// Options for [`DocumentStore::conditional_update`](super::DocumentStore::conditional_update).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Insert a document built from the filter when nothing matches.
    pub upsert: bool,
    /// Return the post-image instead of the pre-image.
    pub return_new: bool,
}

impl UpdateOptions {
    /// Insert-if-absent, returning the resulting document.
    pub fn upsert_returning_new() -> Self {
        Self {
            upsert: true,
            return_new: true,
        }
    }

    /// Update-if-matches, returning the resulting document.
    pub fn returning_new() -> Self {
        Self {
            upsert: false,
            return_new: true,
        }
    }
}
