//! Shadow collection accessor
//!
//! Resolves the shadow collection of one versioned model on a given
//! connection. The first resolution registers the derived shadow shape; later
//! ones return the cached handle. The cache is keyed by connection identity,
//! so tenants sharing a process never see each other's shadow collections.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::observability::{log_event, Event};
use crate::schema::{Schema, SchemaError};
use crate::store::{CollectionHandle, Connection, ConnectionId, StoreError};

use super::errors::ShadowResult;

/// Per-connection cache of shadow collection handles
#[derive(Debug)]
pub struct ShadowAccessor {
    schema: Schema,
    handles: Mutex<HashMap<ConnectionId, CollectionHandle>>,
}

impl ShadowAccessor {
    /// Create an accessor for a derived shadow shape
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Shadow collection name
    pub fn collection_name(&self) -> &str {
        &self.schema.name
    }

    /// Shadow shape registered on every connection
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Return the shadow collection on `connection`, registering it on first use.
    ///
    /// If the name was already registered on the connection by someone else,
    /// the registration is adopted when its shape matches and rejected with a
    /// [`ShadowError::Schema`](super::ShadowError::Schema) otherwise.
    pub fn resolve(&self, connection: &Connection) -> ShadowResult<CollectionHandle> {
        let mut handles = self.handles.lock().map_err(StoreError::from)?;
        if let Some(handle) = handles.get(&connection.id()) {
            return Ok(handle.clone());
        }

        let connection_id = connection.id().to_string();
        let handle = match connection.register(self.schema.clone()) {
            Ok(handle) => {
                log_event(
                    Event::ShadowRegistered,
                    &[
                        ("collection", self.collection_name()),
                        ("connection", connection_id.as_str()),
                    ],
                );
                handle
            }
            Err(StoreError::CollectionExists(name)) => {
                let existing = connection
                    .collection(&name)
                    .ok_or_else(|| StoreError::CollectionNotFound(name.clone()))?;
                if existing.schema() != &self.schema {
                    return Err(SchemaError::shadow_mismatch(name).into());
                }
                log_event(
                    Event::ShadowAdopted,
                    &[
                        ("collection", self.collection_name()),
                        ("connection", connection_id.as_str()),
                    ],
                );
                existing
            }
            Err(e) => return Err(e.into()),
        };

        handles.insert(connection.id(), handle.clone());
        Ok(handle)
    }

    /// Drop the cached handle of a retired connection
    pub fn forget(&self, connection: ConnectionId) -> bool {
        self.handles
            .lock()
            .map(|mut handles| handles.remove(&connection).is_some())
            .unwrap_or(false)
    }

    /// Number of connections with a cached handle
    pub fn cached_connections(&self) -> usize {
        self.handles.lock().map(|handles| handles.len()).unwrap_or(0)
    }
}
