//! Schema mirror: derives the shadow shape from a primary shape
//!
//! The shadow shape carries every declared field of the primary schema except
//! its identifier, plus a back-reference to the primary document and a
//! delete flag. The primary shape gains a pointer to its active version.
//! Name collisions are reported here, before any collection is registered.

use std::collections::HashSet;

use crate::store::ID_FIELD;

use super::errors::{SchemaError, SchemaResult};
use super::types::{FieldDef, Schema};

/// Names of the fields that link primary and shadow documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkFields {
    /// Field on the primary document pointing at its active version
    pub version_id: String,
    /// Field on a version record pointing back at its primary document
    pub version_of_id: String,
    /// Field on a version record marking it as a deletion snapshot
    pub delete_flag: String,
}

impl Default for LinkFields {
    fn default() -> Self {
        Self {
            version_id: "versionId".to_string(),
            version_of_id: "versionOfId".to_string(),
            delete_flag: "deleted".to_string(),
        }
    }
}

impl LinkFields {
    /// Checks that every name is usable and that they are pairwise distinct.
    pub fn validate(&self) -> SchemaResult<()> {
        let names = [&self.version_id, &self.version_of_id, &self.delete_flag];

        for name in names {
            if name.trim().is_empty() {
                return Err(SchemaError::invalid_link_field(name.as_str(), "name is empty"));
            }
            if name.as_str() == ID_FIELD {
                return Err(SchemaError::invalid_link_field(
                    name.as_str(),
                    "the identifier field cannot be a link",
                ));
            }
        }

        let mut seen = HashSet::new();
        for name in names {
            if !seen.insert(name.as_str()) {
                return Err(SchemaError::invalid_link_field(
                    name.as_str(),
                    "used for more than one link",
                ));
            }
        }

        Ok(())
    }
}

/// Primary and shadow shapes of one versioned model
#[derive(Debug, Clone)]
pub struct SchemaMirror {
    primary: Schema,
    shadow: Schema,
    links: LinkFields,
    domain_fields: Vec<String>,
}

impl SchemaMirror {
    /// Derives both shapes.
    ///
    /// `shadow_name` is the collection name of the shadow shape.
    pub fn new(
        primary: &Schema,
        links: LinkFields,
        shadow_name: impl Into<String>,
    ) -> SchemaResult<Self> {
        primary
            .validate_structure()
            .map_err(|reason| SchemaError::invalid_structure(&primary.name, reason))?;
        links.validate()?;

        let shadow_name = shadow_name.into();
        if shadow_name == primary.name {
            return Err(SchemaError::invalid_structure(
                &primary.name,
                "shadow collection name equals the primary collection name",
            ));
        }

        if primary.has_field(&links.version_id) {
            return Err(SchemaError::link_field_collision(&primary.name, &links.version_id));
        }

        // Shadow fields are copied from the primary, so a primary declaration
        // of a shadow-only link collides in the shadow shape.
        for shadow_only in [&links.version_of_id, &links.delete_flag] {
            if primary.has_field(shadow_only) {
                return Err(SchemaError::link_field_collision(&shadow_name, shadow_only));
            }
        }

        let domain_fields = primary.data_fields();

        let mut shadow_fields = primary.fields.clone();
        shadow_fields.insert(ID_FIELD.to_string(), FieldDef::required_string());
        shadow_fields.insert(links.version_of_id.clone(), FieldDef::optional_reference());
        shadow_fields.insert(links.delete_flag.clone(), FieldDef::optional_bool());
        let mut shadow = Schema::new(shadow_name, shadow_fields);
        shadow.description = Some(format!("Version history of {}", primary.name));

        let mut augmented = primary.clone();
        augmented
            .fields
            .insert(links.version_id.clone(), FieldDef::optional_reference());

        Ok(Self {
            primary: augmented,
            shadow,
            links,
            domain_fields,
        })
    }

    /// Primary shape including the active-version pointer
    pub fn primary(&self) -> &Schema {
        &self.primary
    }

    /// Derived shadow shape
    pub fn shadow(&self) -> &Schema {
        &self.shadow
    }

    /// Link field names
    pub fn links(&self) -> &LinkFields {
        &self.links
    }

    /// Domain field names (declared, excluding `_id` and link fields), sorted
    pub fn domain_fields(&self) -> &[String] {
        &self.domain_fields
    }
}
