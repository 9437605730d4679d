//! Schema type definitions
//!
//! Supported types:
//! - string: UTF-8 string
//! - int: 64-bit signed integer
//! - bool: Boolean
//! - float: 64-bit floating point
//! - reference: identifier of a document in some collection
//! - object: Nested object with field schema
//! - array: Homogeneous array with element type

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::store::ID_FIELD;

/// Supported field types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldType {
    /// UTF-8 string
    String,
    /// 64-bit signed integer
    Int,
    /// Boolean
    Bool,
    /// 64-bit floating point
    Float,
    /// Identifier of another document
    Reference,
    /// Nested object with its own field schema
    Object {
        /// Nested field definitions
        fields: HashMap<String, FieldDef>,
    },
    /// Homogeneous array with single element type
    Array {
        /// Element type (boxed to allow recursive types)
        #[serde(rename = "element_type")]
        element_type: Box<FieldType>,
    },
}

impl FieldType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Bool => "bool",
            FieldType::Float => "float",
            FieldType::Reference => "reference",
            FieldType::Object { .. } => "object",
            FieldType::Array { .. } => "array",
        }
    }
}

/// Field definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field data type
    #[serde(flatten)]
    pub field_type: FieldType,
    /// Whether field must be present
    pub required: bool,
}

impl FieldDef {
    /// Create a field of any type
    pub fn new(field_type: FieldType, required: bool) -> Self {
        Self {
            field_type,
            required,
        }
    }

    /// Create a required string field
    pub fn required_string() -> Self {
        Self::new(FieldType::String, true)
    }

    /// Create an optional string field
    pub fn optional_string() -> Self {
        Self::new(FieldType::String, false)
    }

    /// Create an optional int field
    pub fn optional_int() -> Self {
        Self::new(FieldType::Int, false)
    }

    /// Create an optional bool field
    pub fn optional_bool() -> Self {
        Self::new(FieldType::Bool, false)
    }

    /// Create an optional reference field
    pub fn optional_reference() -> Self {
        Self::new(FieldType::Reference, false)
    }

    /// Create an optional array field
    pub fn optional_array(element_type: FieldType) -> Self {
        Self::new(
            FieldType::Array {
                element_type: Box::new(element_type),
            },
            false,
        )
    }
}

/// Declared shape of a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Model name; also the collection name
    pub name: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Field definitions
    pub fields: HashMap<String, FieldDef>,
}

impl Schema {
    /// Create a new schema
    pub fn new(name: impl Into<String>, fields: HashMap<String, FieldDef>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields,
        }
    }

    /// Create a schema from `(name, definition)` pairs
    pub fn with_fields<I, K>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, FieldDef)>,
        K: Into<String>,
    {
        Self::new(
            name,
            fields.into_iter().map(|(k, def)| (k.into(), def)).collect(),
        )
    }

    /// Returns true if the field is declared
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Declared field names other than `_id`, sorted
    pub fn data_fields(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .fields
            .keys()
            .filter(|name| name.as_str() != ID_FIELD)
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Validates the schema structure itself (not a document)
    pub fn validate_structure(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Schema name must not be empty".into());
        }

        // Must have _id field
        let Some(id_field) = self.fields.get(ID_FIELD) else {
            return Err("Schema must define an '_id' field".into());
        };

        // _id must be required
        if !id_field.required {
            return Err("'_id' field must be required".into());
        }

        Ok(())
    }
}
