//! Document store boundary
//!
//! The versioning layer never talks to a database driver directly. Anything
//! that can look documents up, insert, replace, conditionally update and
//! remove them implements [`DocumentStore`].

use async_trait::async_trait;

use super::document::{Document, DocumentId};
use super::errors::StoreResult;
use super::filter::{Filter, Patch, UpdateOptions};

/// Asynchronous document store
///
/// Every method reports failure through [`StoreResult`]. `conditional_update`
/// must be atomic with respect to other calls on the same collection: it is
/// the only primitive the versioning protocol relies on to collapse racing
/// writers.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns every document of a collection matching the filter, in store order.
    async fn find(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>>;

    /// Returns the first document matching the filter.
    async fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        Ok(self.find(collection, filter).await?.into_iter().next())
    }

    /// Returns the document with the given id.
    async fn find_by_id(&self, collection: &str, id: &DocumentId) -> StoreResult<Option<Document>> {
        let filter = Filter::by_id(id.clone());
        self.find_one(collection, &filter).await
    }

    /// Inserts a document, assigning an id when it has none.
    async fn insert(&self, collection: &str, document: Document) -> StoreResult<Document>;

    /// Replaces an existing document by id.
    async fn update(&self, collection: &str, document: Document) -> StoreResult<Document>;

    /// Atomically patches the first document matching the filter.
    ///
    /// With `upsert`, a document seeded from the filter is inserted when
    /// nothing matches. Returns the post-image when `return_new` is set,
    /// otherwise the pre-image (`None` after an insert).
    async fn conditional_update(
        &self,
        collection: &str,
        filter: &Filter,
        patch: &Patch,
        options: UpdateOptions,
    ) -> StoreResult<Option<Document>>;

    /// Removes every document matching the filter, returning the count.
    async fn remove(&self, collection: &str, filter: &Filter) -> StoreResult<u64>;
}
