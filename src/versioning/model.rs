//! Versioned schemas and models
//!
//! A [`VersionedSchema`] is built once per model declaration: it validates the
//! configuration, derives the shadow shape and owns the shadow accessor and
//! the counters. Binding it to a [`Connection`] yields a [`VersionedModel`],
//! which carries both collection handles and exposes the protocol
//! operations.

use std::sync::Arc;

use serde_json::Value;

use crate::observability::{log_event, Event, MetricsSnapshot, ObservationScope, VersionMetrics};
use crate::schema::{Schema, SchemaError, SchemaMirror};
use crate::shadow::ShadowAccessor;
use crate::store::{
    CollectionHandle, Connection, ConnectionId, Document, DocumentId, Fields, Filter, Patch,
    StoreError, UpdateOptions,
};

use super::config::VersioningConfig;
use super::errors::{VersionError, VersionResult};
use super::token::VersionToken;
use super::types::{ActiveDocument, VersionList, VersionRecord};

/// Declaration of a versioned model, independent of any connection
#[derive(Debug)]
pub struct VersionedSchema {
    mirror: Arc<SchemaMirror>,
    config: VersioningConfig,
    accessor: ShadowAccessor,
    metrics: Arc<VersionMetrics>,
}

impl VersionedSchema {
    /// Validate the configuration and derive the shadow shape.
    ///
    /// Link-field collisions are reported here, before anything is
    /// registered.
    pub fn new(primary: Schema, config: VersioningConfig) -> VersionResult<Self> {
        config.validate()?;
        let shadow_name = config.shadow_name(&primary.name);
        let mirror = SchemaMirror::new(&primary, config.link_fields(), shadow_name)?;
        let accessor = ShadowAccessor::new(mirror.shadow().clone());

        Ok(Self {
            mirror: Arc::new(mirror),
            config,
            accessor,
            metrics: Arc::new(VersionMetrics::new()),
        })
    }

    /// Primary and shadow shapes
    pub fn mirror(&self) -> &SchemaMirror {
        &self.mirror
    }

    pub fn config(&self) -> &VersioningConfig {
        &self.config
    }

    /// Bind to a connection, registering the primary and shadow collections
    /// on first use.
    ///
    /// A primary collection already registered under the model name is
    /// adopted only if it was registered with the augmented primary shape.
    pub fn bind(&self, connection: &Connection) -> VersionResult<VersionedModel> {
        let name = self.mirror.primary().name.as_str();
        let primary = match connection.collection(name) {
            Some(existing) => {
                if existing.schema() != self.mirror.primary() {
                    return Err(SchemaError::invalid_structure(
                        name,
                        "collection is registered without the version pointer",
                    )
                    .into());
                }
                existing
            }
            None => connection.register(self.mirror.primary().clone())?,
        };
        let shadow = self.accessor.resolve(connection)?;

        log_event(
            Event::ModelBound,
            &[
                ("model", name),
                ("shadow", shadow.name()),
                ("mode", self.config.mode.as_str()),
            ],
        );

        Ok(VersionedModel {
            mirror: Arc::clone(&self.mirror),
            config: self.config.clone(),
            primary,
            shadow,
            metrics: Arc::clone(&self.metrics),
        })
    }

    /// Drop the cached shadow handle of a retired connection
    pub fn unbind(&self, connection: ConnectionId) -> bool {
        self.accessor.forget(connection)
    }

    /// Counters shared by every model bound from this schema
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

/// A versioned model bound to one connection
#[derive(Debug, Clone)]
pub struct VersionedModel {
    pub(super) mirror: Arc<SchemaMirror>,
    pub(super) config: VersioningConfig,
    pub(super) primary: CollectionHandle,
    pub(super) shadow: CollectionHandle,
    pub(super) metrics: Arc<VersionMetrics>,
}

impl VersionedModel {
    /// Primary collection handle
    pub fn primary(&self) -> &CollectionHandle {
        &self.primary
    }

    /// Shadow collection handle
    pub fn shadow(&self) -> &CollectionHandle {
        &self.shadow
    }

    pub fn config(&self) -> &VersioningConfig {
        &self.config
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    // ==================== Lookups ====================

    /// Every version of an entity plus its active pointer.
    ///
    /// An entity without an active document yields an empty list.
    pub async fn find_versions(&self, entity: &DocumentId) -> VersionResult<VersionList> {
        let Some(active) = self.find_active(entity).await? else {
            return Ok(VersionList::default());
        };

        let versions = self.versions_of(&active.id).await?;
        Ok(VersionList {
            active_id: Some(active.version_id),
            versions,
        })
    }

    /// Every version linked to an already loaded active document
    pub async fn instance_find_versions(
        &self,
        active: &ActiveDocument,
    ) -> VersionResult<Vec<VersionRecord>> {
        self.versions_of(&active.id).await
    }

    pub async fn find_version_by_id(
        &self,
        version: &DocumentId,
    ) -> VersionResult<Option<VersionRecord>> {
        self.shadow
            .find_by_id(version)
            .await?
            .map(|doc| self.to_version_record(doc))
            .transpose()
    }

    pub async fn find_active(&self, entity: &DocumentId) -> VersionResult<Option<ActiveDocument>> {
        self.primary
            .find_by_id(entity)
            .await?
            .map(|doc| self.to_active(doc))
            .transpose()
    }

    /// Resolve the active pointer of an entity to its version record
    pub async fn find_active_version(
        &self,
        entity: &DocumentId,
    ) -> VersionResult<Option<VersionRecord>> {
        match self.find_active(entity).await? {
            Some(active) => self.find_version_by_id(active.version_id.id()).await,
            None => Ok(None),
        }
    }

    async fn versions_of(&self, entity: &DocumentId) -> VersionResult<Vec<VersionRecord>> {
        let filter = Filter::new().where_eq(self.links_version_of(), entity.to_value());
        self.shadow
            .find(&filter)
            .await?
            .into_iter()
            .map(|doc| self.to_version_record(doc))
            .collect()
    }

    // ==================== Conversions ====================

    pub(super) fn links_version_id(&self) -> &str {
        &self.mirror.links().version_id
    }

    pub(super) fn links_version_of(&self) -> &str {
        &self.mirror.links().version_of_id
    }

    pub(super) fn links_delete_flag(&self) -> &str {
        &self.mirror.links().delete_flag
    }

    /// Declared domain fields present in `fields`
    pub(super) fn domain_data(&self, fields: &Fields) -> Fields {
        self.mirror
            .domain_fields()
            .iter()
            .filter_map(|name| fields.get(name).map(|v| (name.clone(), v.clone())))
            .collect()
    }

    /// Overwrite every domain field of `doc` with `data`, removing the ones
    /// `data` lacks
    pub(super) fn replace_domain(&self, doc: &mut Document, data: &Fields) {
        for name in self.mirror.domain_fields() {
            match data.get(name) {
                Some(value) => doc.set(name.clone(), value.clone()),
                None => {
                    doc.unset(name);
                }
            }
        }
    }

    /// Patch that makes a primary document hold `data` and point at `version`
    pub(super) fn promotion_patch(&self, data: &Fields, version: &DocumentId) -> Patch {
        let mut patch = Patch::new().set_all(self.domain_data(data));
        for name in self.mirror.domain_fields() {
            if !data.contains_key(name) {
                patch = patch.unset(name.clone());
            }
        }
        patch.set(self.links_version_id(), version.to_value())
    }

    /// Unsaved shadow document holding `data`
    pub(super) fn version_document(&self, data: &Fields, version_of: Option<&DocumentId>) -> Document {
        let mut doc = Document::new(self.domain_data(data));
        doc.set(
            self.links_version_of(),
            version_of.map_or(Value::Null, DocumentId::to_value),
        );
        doc
    }

    pub(super) fn to_version_record(&self, doc: Document) -> VersionResult<VersionRecord> {
        let id = doc
            .id
            .clone()
            .ok_or_else(|| StoreError::invalid(self.shadow.name(), "version record without id"))?;

        Ok(VersionRecord {
            version_of: doc.id_field(self.links_version_of()),
            deleted: doc.get(self.links_delete_flag()) == Some(&Value::Bool(true)),
            data: self.domain_data(&doc.fields),
            id,
        })
    }

    pub(super) fn to_active(&self, doc: Document) -> VersionResult<ActiveDocument> {
        let id = doc
            .id
            .clone()
            .ok_or_else(|| StoreError::invalid(self.primary.name(), "active document without id"))?;
        let version_id = doc
            .get(self.links_version_id())
            .and_then(VersionToken::from_value)
            .ok_or_else(|| {
                StoreError::invalid(
                    self.primary.name(),
                    format!("active document {} has no {}", id, self.links_version_id()),
                )
            })?;

        Ok(ActiveDocument {
            data: self.domain_data(&doc.fields),
            id,
            version_id,
        })
    }

    // ==================== Shared steps ====================

    /// Point a version record at its active document
    pub(super) async fn link_version(
        &self,
        version: &DocumentId,
        entity: &DocumentId,
    ) -> VersionResult<VersionRecord> {
        let patch = Patch::new().set(self.links_version_of(), entity.to_value());
        let linked = self
            .shadow
            .conditional_update(
                &Filter::by_id(version.clone()),
                &patch,
                UpdateOptions::returning_new(),
            )
            .await?
            .ok_or_else(|| VersionError::VersionNotFound(version.clone()))?;
        self.to_version_record(linked)
    }

    /// Token conflict: log, count and build the error
    pub(super) fn conflict(
        &self,
        entity: &DocumentId,
        expected: VersionToken,
        actual: VersionToken,
    ) -> VersionError {
        self.metrics.increment_conflicts();
        log_event(
            Event::ConcurrencyConflict,
            &[
                ("entity", entity.as_str()),
                ("expected", expected.id().as_str()),
                ("actual", actual.id().as_str()),
            ],
        );
        VersionError::Conflict {
            entity: entity.clone(),
            expected,
            actual,
        }
    }

    /// Best-effort removal of a speculative version record.
    ///
    /// Failures are logged and counted, never returned.
    pub(super) async fn compensate_delete(&self, version: &DocumentId, reason: &str) {
        let outcome = self.shadow.remove(&Filter::by_id(version.clone())).await;
        self.record_compensation(version, reason, outcome.map(|_| ()));
    }

    /// Best-effort removal of a delete flag set in place
    pub(super) async fn compensate_unflag(&self, version: &DocumentId, reason: &str) {
        let patch = Patch::new().unset(self.links_delete_flag());
        let outcome = self
            .shadow
            .conditional_update(&Filter::by_id(version.clone()), &patch, UpdateOptions::default())
            .await;
        self.record_compensation(version, reason, outcome.map(|_| ()));
    }

    fn record_compensation(
        &self,
        version: &DocumentId,
        reason: &str,
        outcome: Result<(), StoreError>,
    ) {
        match outcome {
            Ok(()) => {
                self.metrics.increment_compensations();
                log_event(
                    Event::CompensationApplied,
                    &[("version_id", version.as_str()), ("reason", reason)],
                );
            }
            Err(e) => {
                self.metrics.increment_compensation_failures();
                let error = e.to_string();
                log_event(
                    Event::CompensationFailed,
                    &[
                        ("version_id", version.as_str()),
                        ("reason", reason),
                        ("error", error.as_str()),
                    ],
                );
            }
        }
    }
}

/// Close an operation scope according to its result
pub(super) fn finish<T>(scope: ObservationScope, result: VersionResult<T>) -> VersionResult<T> {
    match &result {
        Ok(_) => scope.complete(),
        Err(e) => scope.fail(e.code()),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDef;
    use crate::store::InMemoryStore;
    use serde_json::json;

    fn post_schema() -> Schema {
        Schema::with_fields(
            "Post",
            [
                ("_id", FieldDef::required_string()),
                ("title", FieldDef::required_string()),
                ("body", FieldDef::optional_string()),
            ],
        )
    }

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_bind_registers_both_collections() {
        let schema = VersionedSchema::new(post_schema(), VersioningConfig::default()).unwrap();
        let conn = Connection::open(InMemoryStore::new());
        let model = schema.bind(&conn).unwrap();

        assert_eq!(model.primary().name(), "Post");
        assert_eq!(model.shadow().name(), "PostShadow");
        assert_eq!(
            conn.collection_names(),
            vec!["Post".to_string(), "PostShadow".to_string()]
        );
        assert!(model.primary().schema().has_field("versionId"));
    }

    #[test]
    fn test_bind_twice_reuses_registrations() {
        let schema = VersionedSchema::new(post_schema(), VersioningConfig::default()).unwrap();
        let conn = Connection::open(InMemoryStore::new());
        let first = schema.bind(&conn).unwrap();
        let second = schema.bind(&conn).unwrap();

        assert!(first.primary().same_collection(second.primary()));
        assert!(first.shadow().same_collection(second.shadow()));
    }

    #[test]
    fn test_bind_rejects_unaugmented_primary() {
        let schema = VersionedSchema::new(post_schema(), VersioningConfig::default()).unwrap();
        let conn = Connection::open(InMemoryStore::new());
        conn.register(post_schema()).unwrap();

        let err = schema.bind(&conn).unwrap_err();
        assert_eq!(err.code(), "SCHEMA_INVALID_STRUCTURE");
    }

    #[test]
    fn test_collision_fails_at_declaration() {
        let mut primary = post_schema();
        primary
            .fields
            .insert("versionId".into(), FieldDef::optional_string());

        let err = VersionedSchema::new(primary, VersioningConfig::default()).unwrap_err();
        assert_eq!(err.code(), "SCHEMA_LINK_FIELD_COLLISION");
    }

    #[test]
    fn test_unbind_forgets_connection() {
        let schema = VersionedSchema::new(post_schema(), VersioningConfig::default()).unwrap();
        let conn = Connection::open(InMemoryStore::new());
        schema.bind(&conn).unwrap();

        assert!(schema.unbind(conn.id()));
        assert!(!schema.unbind(conn.id()));
    }

    #[test]
    fn test_conversions_use_link_names() {
        let schema = VersionedSchema::new(post_schema(), VersioningConfig::default()).unwrap();
        let conn = Connection::open(InMemoryStore::new());
        let model = schema.bind(&conn).unwrap();

        let raw = Document::from_json(json!({
            "_id": "v1",
            "title": "A",
            "undeclared": 1,
            "versionOfId": "p1",
            "deleted": true,
        }))
        .unwrap();
        let record = model.to_version_record(raw).unwrap();
        assert_eq!(record.id, DocumentId::new("v1"));
        assert_eq!(record.version_of, Some(DocumentId::new("p1")));
        assert!(record.deleted);
        assert_eq!(record.data, fields(json!({"title": "A"})));

        let no_pointer = Document::from_json(json!({"_id": "p1", "title": "A"})).unwrap();
        let err = model.to_active(no_pointer).unwrap_err();
        assert_eq!(err.code(), "STORE_INVALID_DOCUMENT");
    }

    #[test]
    fn test_promotion_patch_unsets_missing_fields() {
        let schema = VersionedSchema::new(post_schema(), VersioningConfig::default()).unwrap();
        let conn = Connection::open(InMemoryStore::new());
        let model = schema.bind(&conn).unwrap();

        let patch = model.promotion_patch(&fields(json!({"title": "B"})), &DocumentId::new("v2"));
        assert_eq!(patch.set.get("title"), Some(&json!("B")));
        assert_eq!(patch.set.get("versionId"), Some(&json!("v2")));
        assert_eq!(patch.unset, vec!["body".to_string()]);
    }

    #[tokio::test]
    async fn test_find_versions_of_missing_entity_is_empty() {
        let schema = VersionedSchema::new(post_schema(), VersioningConfig::default()).unwrap();
        let conn = Connection::open(InMemoryStore::new());
        let model = schema.bind(&conn).unwrap();

        let list = model.find_versions(&DocumentId::new("nope")).await.unwrap();
        assert_eq!(list, VersionList::default());
        assert!(model
            .find_active_version(&DocumentId::new("nope"))
            .await
            .unwrap()
            .is_none());
    }
}
