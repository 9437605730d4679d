//! Version protocol
//!
//! Document-level versioning over a primary and a shadow collection:
//! - `VersionedSchema` - Declaration, shadow derivation, per-model counters
//! - `VersionedModel` - Protocol operations on one connection
//! - `VersionToken` - Optimistic-concurrency token
//! - `VersionRecord` / `ActiveDocument` - Typed views over raw documents
//! - `snapshot` - Conversion of typed values into field maps
//!
//! # Design Principles
//!
//! 1. The version record is persisted before the active document is touched
//! 2. Token comparisons are by value on normalized identifiers
//! 3. Conflicts are detected, never resolved
//! 4. Compensating writes are best effort and only logged on failure
//!
//! # Usage
//!
//! ```ignore
//! let schema = VersionedSchema::new(post_schema, VersioningConfig::default())?;
//! let posts = schema.bind(&connection)?;
//!
//! let v1 = posts.save_new_version_of(&entity, to_fields(&draft)?).await?;
//! posts.activate_version(&v1.id).await?;
//! ```

mod config;
mod errors;
mod lifecycle;
mod model;
mod save;
pub mod snapshot;
mod token;
mod types;
mod upsert;

pub use config::{VersioningConfig, VersioningMode};
pub use errors::{VersionError, VersionResult};
pub use model::{VersionedModel, VersionedSchema};
pub use snapshot::{fingerprint, to_fields};
pub use token::VersionToken;
pub use types::{
    ActiveDocument, DeleteOutcome, SaveVersionInput, UpsertInput, VersionList, VersionRecord,
};
