//! Schema configuration errors
//!
//! Error codes:
//! - SCHEMA_INVALID_STRUCTURE
//! - SCHEMA_INVALID_LINK_FIELD
//! - SCHEMA_LINK_FIELD_COLLISION
//! - SCHEMA_SHADOW_MISMATCH
//!
//! All of them are raised while a versioned model is being set up and are
//! never retried.

use std::fmt;

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Primary schema is structurally invalid (missing `_id`, empty name)
    InvalidStructure,
    /// Configured link field name is unusable
    InvalidLinkField,
    /// Configured link field name already declared by the schema
    LinkFieldCollision,
    /// Shadow collection registered on a connection with another shape
    ShadowMismatch,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::InvalidStructure => "SCHEMA_INVALID_STRUCTURE",
            SchemaErrorCode::InvalidLinkField => "SCHEMA_INVALID_LINK_FIELD",
            SchemaErrorCode::LinkFieldCollision => "SCHEMA_LINK_FIELD_COLLISION",
            SchemaErrorCode::ShadowMismatch => "SCHEMA_SHADOW_MISMATCH",
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error type with full context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    /// Error code
    code: SchemaErrorCode,
    /// Human-readable message
    message: String,
    /// Schema name if applicable
    schema: Option<String>,
    /// Offending field if applicable
    field: Option<String>,
}

impl SchemaError {
    /// Create an invalid structure error
    pub fn invalid_structure(schema: impl Into<String>, reason: impl Into<String>) -> Self {
        let schema = schema.into();
        Self {
            code: SchemaErrorCode::InvalidStructure,
            message: format!("Schema '{}' is invalid: {}", schema, reason.into()),
            schema: Some(schema),
            field: None,
        }
    }

    /// Create an invalid link field error
    pub fn invalid_link_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            code: SchemaErrorCode::InvalidLinkField,
            message: format!("Link field '{}' is invalid: {}", field, reason.into()),
            schema: None,
            field: Some(field),
        }
    }

    /// Create a link field collision error
    pub fn link_field_collision(schema: impl Into<String>, field: impl Into<String>) -> Self {
        let schema = schema.into();
        let field = field.into();
        Self {
            code: SchemaErrorCode::LinkFieldCollision,
            message: format!(
                "Schema '{}' already declares '{}'; choose another link field name",
                schema, field
            ),
            schema: Some(schema),
            field: Some(field),
        }
    }

    /// Create a shadow shape mismatch error
    pub fn shadow_mismatch(schema: impl Into<String>) -> Self {
        let schema = schema.into();
        Self {
            code: SchemaErrorCode::ShadowMismatch,
            message: format!(
                "Collection '{}' is already registered with a different shape",
                schema
            ),
            schema: Some(schema),
            field: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the schema name if applicable
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Returns the offending field if applicable
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[FATAL] {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
