//! Typed views over raw documents and operation inputs/outputs

use serde::Serialize;
use serde_json::Value;

use crate::store::{DocumentId, Fields, Filter};

use super::token::VersionToken;

/// A snapshot stored in the shadow collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionRecord {
    /// Version record id
    pub id: DocumentId,
    /// Active document this version belongs to
    pub version_of: Option<DocumentId>,
    /// Terminal record left behind by a soft delete
    pub deleted: bool,
    /// Domain fields
    pub data: Fields,
}

impl VersionRecord {
    /// Token naming this version
    pub fn token(&self) -> VersionToken {
        VersionToken::new(self.id.clone())
    }

    /// Domain field value
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }
}

/// The authoritative document in the primary collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveDocument {
    /// Active document id
    pub id: DocumentId,
    /// Version record currently considered authoritative
    pub version_id: VersionToken,
    /// Domain fields
    pub data: Fields,
}

impl ActiveDocument {
    /// Domain field value
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }
}

/// Result of `find_versions`
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct VersionList {
    /// Active version of the entity, `None` if the entity does not exist
    pub active_id: Option<VersionToken>,
    /// Every version of the entity, in store order
    pub versions: Vec<VersionRecord>,
}

impl VersionList {
    /// The record named by `active_id`, if present in `versions`
    pub fn active(&self) -> Option<&VersionRecord> {
        let active = self.active_id.as_ref()?;
        self.versions.iter().find(|v| active.names(&v.id))
    }
}

/// Result of `delete_version`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub success: bool,
}

impl DeleteOutcome {
    pub fn deleted() -> Self {
        Self { success: true }
    }

    pub fn refused() -> Self {
        Self { success: false }
    }
}

/// Input of `save_version`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveVersionInput {
    /// Domain fields to store
    pub data: Fields,
    /// Existing version to overwrite (or, in append-only mode, to base the edit on)
    pub version_id: Option<VersionToken>,
    /// Active document the version belongs to
    pub version_of_id: Option<DocumentId>,
}

impl SaveVersionInput {
    /// Save `data` as a brand-new version of `entity`
    pub fn new_version_of(entity: DocumentId, data: Fields) -> Self {
        Self {
            data,
            version_id: None,
            version_of_id: Some(entity),
        }
    }

    /// Save `data` onto an existing version of `entity`
    pub fn edit(version: VersionToken, entity: DocumentId, data: Fields) -> Self {
        Self {
            data,
            version_id: Some(version),
            version_of_id: Some(entity),
        }
    }
}

/// Input of `upsert_version`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpsertInput {
    /// Existing active document; `None` creates a new entity
    pub id: Option<DocumentId>,
    /// Domain fields, the complete new state
    pub data: Fields,
    /// Version the caller last saw active
    pub version_id: Option<VersionToken>,
    /// Uniqueness query that racing creators must agree on
    pub query: Option<Filter>,
}

impl UpsertInput {
    /// Create a new entity, collapsing racing creators on `query`
    pub fn create(data: Fields, query: Option<Filter>) -> Self {
        Self {
            data,
            query,
            ..Default::default()
        }
    }

    /// Replace the state of an existing entity
    pub fn update(id: DocumentId, version_id: Option<VersionToken>, data: Fields) -> Self {
        Self {
            id: Some(id),
            data,
            version_id,
            query: None,
        }
    }
}
