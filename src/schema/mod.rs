//! Schema subsystem
//!
//! Declared shapes of collections and the mirror that derives a shadow shape
//! for version records.
//!
//! # Design Principles
//!
//! - Shapes are declared up front, never inferred from documents
//! - Link field collisions are configuration errors raised at setup
//! - The shadow shape is derived, never declared by hand

mod errors;
mod mirror;
mod types;

pub use errors::{SchemaError, SchemaErrorCode, SchemaResult};
pub use mirror::{LinkFields, SchemaMirror};
pub use types::{FieldDef, FieldType, Schema};
