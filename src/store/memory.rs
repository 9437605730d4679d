//! In-memory document store
//!
//! Keeps each collection as an insertion-ordered list behind one `RwLock`.
//! Every operation runs under a single lock acquisition, which makes
//! `conditional_update` atomic.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::backend::DocumentStore;
use super::document::{Document, DocumentId};
use super::errors::{StoreError, StoreResult};
use super::filter::{Filter, Patch, UpdateOptions};

/// Collection name -> documents in insertion order
type CollectionMap = HashMap<String, Vec<Document>>;

/// In-memory store for tests and embedded use
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: RwLock<CollectionMap>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection
    pub fn count(&self, collection: &str) -> usize {
        self.data
            .read()
            .map(|data| data.get(collection).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    fn insert_locked(
        data: &mut CollectionMap,
        collection: &str,
        mut document: Document,
    ) -> StoreResult<Document> {
        let docs = data.entry(collection.to_string()).or_default();
        let id = document.id.get_or_insert_with(DocumentId::generate).clone();

        if docs.iter().any(|d| d.id.as_ref() == Some(&id)) {
            return Err(StoreError::DuplicateId {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }

        docs.push(document.clone());
        Ok(document)
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn find(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>> {
        tokio::task::yield_now().await;
        let data = self.data.read()?;
        Ok(data
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default())
    }

    async fn insert(&self, collection: &str, document: Document) -> StoreResult<Document> {
        tokio::task::yield_now().await;
        let mut data = self.data.write()?;
        Self::insert_locked(&mut data, collection, document)
    }

    async fn update(&self, collection: &str, document: Document) -> StoreResult<Document> {
        tokio::task::yield_now().await;
        let id = document
            .id
            .clone()
            .ok_or_else(|| StoreError::invalid(collection, "update requires an id"))?;

        let mut data = self.data.write()?;
        let slot = data
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id.as_ref() == Some(&id)))
            .ok_or_else(|| StoreError::not_found(collection, &id))?;

        *slot = document.clone();
        Ok(document)
    }

    async fn conditional_update(
        &self,
        collection: &str,
        filter: &Filter,
        patch: &Patch,
        options: UpdateOptions,
    ) -> StoreResult<Option<Document>> {
        tokio::task::yield_now().await;
        let mut data = self.data.write()?;

        let matched = data
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| filter.matches(d)));

        if let Some(doc) = matched {
            let before = doc.clone();
            patch.apply(doc);
            return Ok(Some(if options.return_new { doc.clone() } else { before }));
        }

        if !options.upsert {
            return Ok(None);
        }

        let mut seeded = filter.seed_document();
        patch.apply_on_insert(&mut seeded);
        let inserted = Self::insert_locked(&mut data, collection, seeded)?;
        Ok(options.return_new.then_some(inserted))
    }

    async fn remove(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        tokio::task::yield_now().await;
        let mut data = self.data.write()?;
        let Some(docs) = data.get_mut(collection) else {
            return Ok(0);
        };

        let before = docs.len();
        docs.retain(|d| !filter.matches(d));
        Ok((before - docs.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(fields: serde_json::Value) -> Document {
        Document::from_json(fields).unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_find_by_id() {
        let store = InMemoryStore::new();
        let saved = store.insert("posts", doc(json!({"title": "A"}))).await.unwrap();
        let id = saved.id.clone().unwrap();

        let found = store.find_by_id("posts", &id).await.unwrap().unwrap();
        assert_eq!(found, saved);
        assert_eq!(store.count("posts"), 1);
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let store = InMemoryStore::new();
        store.insert("posts", doc(json!({"_id": "p1"}))).await.unwrap();
        let err = store.insert("posts", doc(json!({"_id": "p1"}))).await.unwrap_err();
        assert_eq!(err.code(), "STORE_DUPLICATE_ID");
    }

    #[tokio::test]
    async fn test_find_preserves_insertion_order() {
        let store = InMemoryStore::new();
        for i in 0..5 {
            store.insert("posts", doc(json!({"n": i, "kind": "x"}))).await.unwrap();
        }
        let all = store.find("posts", &Filter::new().where_eq("kind", "x")).await.unwrap();
        let order: Vec<_> = all.iter().map(|d| d.get("n").cloned().unwrap()).collect();
        assert_eq!(order, vec![json!(0), json!(1), json!(2), json!(3), json!(4)]);
    }

    #[tokio::test]
    async fn test_update_missing_document_fails() {
        let store = InMemoryStore::new();
        let err = store.update("posts", doc(json!({"_id": "nope"}))).await.unwrap_err();
        assert!(matches!(err, StoreError::DocumentNotFound { .. }));

        let err = store.update("posts", doc(json!({}))).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidDocument { .. }));
    }

    #[tokio::test]
    async fn test_conditional_update_guards_on_filter() {
        let store = InMemoryStore::new();
        store
            .insert("posts", doc(json!({"_id": "p1", "versionId": "v1"})))
            .await
            .unwrap();

        let stale = Filter::by_id(DocumentId::new("p1")).where_eq("versionId", "v0");
        let patch = Patch::new().set("versionId", "v2");
        let result = store
            .conditional_update("posts", &stale, &patch, UpdateOptions::returning_new())
            .await
            .unwrap();
        assert!(result.is_none());

        let current = Filter::by_id(DocumentId::new("p1")).where_eq("versionId", "v1");
        let result = store
            .conditional_update("posts", &current, &patch, UpdateOptions::returning_new())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.get("versionId"), Some(&json!("v2")));
    }

    #[tokio::test]
    async fn test_conditional_upsert_inserts_once() {
        let store = InMemoryStore::new();
        let filter = Filter::new().where_eq("hash", "abc");
        let first = Patch::new().set_on_insert("versionId", "v1");
        let second = Patch::new().set_on_insert("versionId", "v2");

        let a = store
            .conditional_update("posts", &filter, &first, UpdateOptions::upsert_returning_new())
            .await
            .unwrap()
            .unwrap();
        let b = store
            .conditional_update("posts", &filter, &second, UpdateOptions::upsert_returning_new())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(a.id, b.id);
        assert_eq!(b.get("versionId"), Some(&json!("v1")));
        assert_eq!(b.get("hash"), Some(&json!("abc")));
        assert_eq!(store.count("posts"), 1);
    }

    #[tokio::test]
    async fn test_pre_image_is_returned_without_return_new() {
        let store = InMemoryStore::new();
        store.insert("posts", doc(json!({"_id": "p1", "n": 1}))).await.unwrap();

        let before = store
            .conditional_update(
                "posts",
                &Filter::by_id(DocumentId::new("p1")),
                &Patch::new().set("n", 2),
                UpdateOptions::default(),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(before.get("n"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_remove_counts_matches() {
        let store = InMemoryStore::new();
        for kind in ["a", "b", "a"] {
            store.insert("posts", doc(json!({"kind": kind}))).await.unwrap();
        }
        let removed = store.remove("posts", &Filter::new().where_eq("kind", "a")).await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.count("posts"), 1);
        assert_eq!(store.remove("other", &Filter::new()).await.unwrap(), 0);
    }
}
