//! Store connections and collection handles
//!
//! A [`Connection`] pairs a document store with its own registry of declared
//! collections. Several connections may share one process (one per tenant,
//! for example); nothing registered on one is visible from another.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use crate::schema::Schema;

use super::backend::DocumentStore;
use super::document::{Document, DocumentId};
use super::errors::{StoreError, StoreResult};
use super::filter::{Filter, Patch, UpdateOptions};

/// Identity of a connection, stable for its lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A document store plus the collections registered on it
pub struct Connection {
    id: ConnectionId,
    store: Arc<dyn DocumentStore>,
    collections: RwLock<HashMap<String, CollectionHandle>>,
}

impl Connection {
    /// Open a connection over a store
    pub fn open(store: impl DocumentStore + 'static) -> Self {
        Self::from_shared(Arc::new(store))
    }

    /// Open a connection over a store that is also used elsewhere
    pub fn from_shared(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            id: ConnectionId::generate(),
            store,
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Connection identity
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Register a collection under its schema name.
    ///
    /// Registering the same name twice on one connection fails with
    /// [`StoreError::CollectionExists`].
    pub fn register(&self, schema: Schema) -> StoreResult<CollectionHandle> {
        let mut collections = self.collections.write()?;
        if collections.contains_key(&schema.name) {
            return Err(StoreError::CollectionExists(schema.name));
        }

        let handle = CollectionHandle {
            connection: self.id,
            schema: Arc::new(schema),
            store: Arc::clone(&self.store),
        };
        collections.insert(handle.name().to_string(), handle.clone());
        Ok(handle)
    }

    /// Look up a registered collection
    pub fn collection(&self, name: &str) -> Option<CollectionHandle> {
        self.collections
            .read()
            .ok()
            .and_then(|collections| collections.get(name).cloned())
    }

    /// Names of every registered collection, sorted
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .collections
            .read()
            .map(|collections| collections.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("collections", &self.collection_names())
            .finish()
    }
}

/// Handle to one registered collection on one connection
#[derive(Clone)]
pub struct CollectionHandle {
    connection: ConnectionId,
    schema: Arc<Schema>,
    store: Arc<dyn DocumentStore>,
}

impl CollectionHandle {
    /// Collection name
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    /// Declared shape
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Connection this handle was registered on
    pub fn connection_id(&self) -> ConnectionId {
        self.connection
    }

    /// True if both handles address the same registration
    pub fn same_collection(&self, other: &CollectionHandle) -> bool {
        self.connection == other.connection && Arc::ptr_eq(&self.schema, &other.schema)
    }

    pub async fn find(&self, filter: &Filter) -> StoreResult<Vec<Document>> {
        self.store.find(self.name(), filter).await
    }

    pub async fn find_one(&self, filter: &Filter) -> StoreResult<Option<Document>> {
        self.store.find_one(self.name(), filter).await
    }

    pub async fn find_by_id(&self, id: &DocumentId) -> StoreResult<Option<Document>> {
        self.store.find_by_id(self.name(), id).await
    }

    pub async fn insert(&self, document: Document) -> StoreResult<Document> {
        self.store.insert(self.name(), document).await
    }

    pub async fn update(&self, document: Document) -> StoreResult<Document> {
        self.store.update(self.name(), document).await
    }

    pub async fn conditional_update(
        &self,
        filter: &Filter,
        patch: &Patch,
        options: UpdateOptions,
    ) -> StoreResult<Option<Document>> {
        self.store
            .conditional_update(self.name(), filter, patch, options)
            .await
    }

    pub async fn remove(&self, filter: &Filter) -> StoreResult<u64> {
        self.store.remove(self.name(), filter).await
    }
}

impl fmt::Debug for CollectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionHandle")
            .field("name", &self.schema.name)
            .field("connection", &self.connection)
            .finish()
    }
}
