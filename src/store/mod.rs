//! Document store boundary
//!
//! The versioning layer consumes a store through this module only: an async
//! [`DocumentStore`] trait, the [`Document`] it exchanges, equality
//! [`Filter`]s and [`Patch`]es, and per-connection collection registries.
//!
//! # Design Principles
//!
//! - Identifiers are normalized once, here, and compared by value everywhere
//! - `conditional_update` is the only atomic primitive
//! - Connections never share registered collections

mod backend;
mod connection;
mod document;
mod errors;
mod filter;
mod memory;

pub use backend::DocumentStore;
pub use connection::{CollectionHandle, Connection, ConnectionId};
pub use document::{Document, DocumentId, Fields, ID_FIELD};
pub use errors::{StoreError, StoreResult};
pub use filter::{Filter, Patch, UpdateOptions};
pub use memory::InMemoryStore;
