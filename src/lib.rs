//! docver - Document-level versioning over a document store
//!
//! Every active document in a primary collection keeps its history as
//! version records in a parallel shadow collection, and points at the one
//! version it currently reflects.

pub mod observability;
pub mod schema;
pub mod shadow;
pub mod store;
pub mod versioning;

pub use store::{Connection, DocumentId, DocumentStore, Fields, Filter, InMemoryStore};
pub use versioning::{
    VersionError, VersionResult, VersionToken, VersionedModel, VersionedSchema, VersioningConfig,
    VersioningMode,
};
