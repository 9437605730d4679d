//! Versioning configuration
//!
//! Link field names, shadow collection naming and the write mode. Every field
//! has a default, so an empty JSON object is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::schema::{LinkFields, SchemaResult};

/// How saves and deletions treat existing version records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersioningMode {
    /// Saves naming a version overwrite it; deletes need the current token
    /// and write a new terminal record
    #[default]
    Standard,
    /// Every save inserts a new record; deletes need no token
    AppendOnly,
    /// Like `Standard`, but deletes flag the active record in place
    Flagged,
}

impl VersioningMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersioningMode::Standard => "standard",
            VersioningMode::AppendOnly => "append_only",
            VersioningMode::Flagged => "flagged",
        }
    }

    /// True if version records are never overwritten
    pub fn is_append_only(&self) -> bool {
        matches!(self, VersioningMode::AppendOnly)
    }

    /// True if callers must present a version token to delete or update
    pub fn requires_token(&self) -> bool {
        !self.is_append_only()
    }
}

/// Versioning configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersioningConfig {
    /// Pointer from the active document to its version (default: "versionId")
    #[serde(default = "default_version_id_field")]
    pub version_id_field: String,

    /// Back-reference from a version to its active document (default: "versionOfId")
    #[serde(default = "default_version_of_id_field")]
    pub version_of_id_field: String,

    /// Delete flag on terminal version records (default: "deleted")
    #[serde(default = "default_delete_flag_field")]
    pub delete_flag_field: String,

    /// Suffix appended to the model name for the shadow collection (default: "Shadow")
    #[serde(default = "default_shadow_suffix")]
    pub shadow_suffix: String,

    /// Write mode (default: standard)
    #[serde(default)]
    pub mode: VersioningMode,
}

fn default_version_id_field() -> String {
    "versionId".to_string()
}

fn default_version_of_id_field() -> String {
    "versionOfId".to_string()
}

fn default_delete_flag_field() -> String {
    "deleted".to_string()
}

fn default_shadow_suffix() -> String {
    "Shadow".to_string()
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            version_id_field: default_version_id_field(),
            version_of_id_field: default_version_of_id_field(),
            delete_flag_field: default_delete_flag_field(),
            shadow_suffix: default_shadow_suffix(),
            mode: VersioningMode::default(),
        }
    }
}

impl VersioningConfig {
    /// Create a config with the given mode
    pub fn with_mode(mode: VersioningMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Link field names as understood by the schema mirror
    pub fn link_fields(&self) -> LinkFields {
        LinkFields {
            version_id: self.version_id_field.clone(),
            version_of_id: self.version_of_id_field.clone(),
            delete_flag: self.delete_flag_field.clone(),
        }
    }

    /// Shadow collection name for a model
    pub fn shadow_name(&self, model_name: &str) -> String {
        format!("{}{}", model_name, self.shadow_suffix)
    }

    /// Static checks that do not need a schema
    pub fn validate(&self) -> SchemaResult<()> {
        self.link_fields().validate()
    }
}
