//! Failure Injection Tests
//!
//! Behavior of the protocol when individual store round-trips fail:
//! - Completed steps are never rolled back
//! - Store errors surface verbatim at the failing step
//! - Failed compensations are counted and logged, never escalated

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use docver::schema::{FieldDef, Schema};
use docver::store::{
    Connection, Document, DocumentId, DocumentStore, Fields, Filter, InMemoryStore, Patch,
    StoreError, StoreResult, UpdateOptions,
};
use docver::versioning::{
    SaveVersionInput, UpsertInput, VersionError, VersionToken, VersionedModel, VersionedSchema,
    VersioningConfig,
};
use serde_json::{json, Value};

// =============================================================================
// Faulty Store
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Insert,
    Update,
    ConditionalUpdate,
    Remove,
}

/// In-memory store that fails chosen operations on chosen collections
#[derive(Default)]
struct FaultyStore {
    inner: InMemoryStore,
    faults: Mutex<Vec<(Op, String)>>,
}

impl FaultyStore {
    fn fail(&self, op: Op, collection: &str) {
        self.faults.lock().unwrap().push((op, collection.to_string()));
    }

    fn heal(&self) {
        self.faults.lock().unwrap().clear();
    }

    fn check(&self, op: Op, collection: &str) -> StoreResult<()> {
        let faults = self.faults.lock().unwrap();
        if faults.iter().any(|(o, c)| *o == op && c == collection) {
            return Err(StoreError::Unavailable(format!("{:?} on {}", op, collection)));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FaultyStore {
    async fn find(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>> {
        self.inner.find(collection, filter).await
    }

    async fn insert(&self, collection: &str, document: Document) -> StoreResult<Document> {
        self.check(Op::Insert, collection)?;
        self.inner.insert(collection, document).await
    }

    async fn update(&self, collection: &str, document: Document) -> StoreResult<Document> {
        self.check(Op::Update, collection)?;
        self.inner.update(collection, document).await
    }

    async fn conditional_update(
        &self,
        collection: &str,
        filter: &Filter,
        patch: &Patch,
        options: UpdateOptions,
    ) -> StoreResult<Option<Document>> {
        self.check(Op::ConditionalUpdate, collection)?;
        self.inner
            .conditional_update(collection, filter, patch, options)
            .await
    }

    async fn remove(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        self.check(Op::Remove, collection)?;
        self.inner.remove(collection, filter).await
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn setup() -> (Arc<FaultyStore>, VersionedModel) {
    let store = Arc::new(FaultyStore::default());
    let shared: Arc<dyn DocumentStore> = store.clone();
    let schema = VersionedSchema::new(
        Schema::with_fields(
            "Page",
            [
                ("_id", FieldDef::required_string()),
                ("title", FieldDef::required_string()),
            ],
        ),
        VersioningConfig::default(),
    )
    .unwrap();
    let model = schema.bind(&Connection::from_shared(shared)).unwrap();
    (store, model)
}

fn fields(value: Value) -> Fields {
    value.as_object().cloned().unwrap()
}

fn unavailable(err: &VersionError) -> bool {
    matches!(err, VersionError::Store(StoreError::Unavailable(_)))
}

// =============================================================================
// Save Failure Tests
// =============================================================================

/// A failed promotion keeps the saved version and surfaces the store error.
#[tokio::test]
async fn test_failed_promotion_keeps_version() {
    let (store, model) = setup();
    let v1 = model
        .save_new_version_of(&DocumentId::generate(), fields(json!({"title": "A"})))
        .await
        .unwrap();
    let a = v1.version_of.clone().unwrap();

    store.fail(Op::ConditionalUpdate, "Page");
    let err = model
        .save_version(SaveVersionInput::edit(
            v1.token(),
            a.clone(),
            fields(json!({"title": "B"})),
        ))
        .await
        .unwrap_err();

    assert!(unavailable(&err));
    assert_eq!(err.code(), "STORE_UNAVAILABLE");

    let version = model.find_version_by_id(&v1.id).await.unwrap().unwrap();
    assert_eq!(version.get("title"), Some(&json!("B")));
    let active = model.find_active(&a).await.unwrap().unwrap();
    assert_eq!(active.get("title"), Some(&json!("A")));
}

/// A first save whose active document cannot be created leaves the version behind.
#[tokio::test]
async fn test_failed_lineage_keeps_version() {
    let (store, model) = setup();
    let e = DocumentId::generate();

    store.fail(Op::Insert, "Page");
    let err = model
        .save_new_version_of(&e, fields(json!({"title": "A"})))
        .await
        .unwrap_err();
    assert!(unavailable(&err));

    let orphans = model.shadow().find(&Filter::new()).await.unwrap();
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].id_field("versionOfId"), Some(e));
    assert!(model.primary().find(&Filter::new()).await.unwrap().is_empty());
}

/// Nothing is written when the version record itself cannot be stored.
#[tokio::test]
async fn test_failed_version_write_touches_nothing() {
    let (store, model) = setup();
    store.fail(Op::Insert, "PageShadow");

    let err = model
        .save_new_version_of(&DocumentId::generate(), fields(json!({"title": "A"})))
        .await
        .unwrap_err();
    assert!(unavailable(&err));
    assert!(model.primary().find(&Filter::new()).await.unwrap().is_empty());
    assert_eq!(model.metrics().versions_saved, 0);
}

// =============================================================================
// Activation Failure Tests
// =============================================================================

/// A failed activation leaves the pointer where it was.
#[tokio::test]
async fn test_failed_activation_keeps_pointer() {
    let (store, model) = setup();
    let v1 = model
        .save_new_version_of(&DocumentId::generate(), fields(json!({"title": "A"})))
        .await
        .unwrap();
    let a = v1.version_of.clone().unwrap();
    let v2 = model
        .save_new_version_of(&a, fields(json!({"title": "B"})))
        .await
        .unwrap();

    store.fail(Op::Update, "Page");
    let err = model.activate_version(&v2.id).await.unwrap_err();
    assert!(unavailable(&err));

    store.heal();
    let active = model.find_active(&a).await.unwrap().unwrap();
    assert_eq!(active.version_id, v1.token());
    assert_eq!(model.metrics().activations, 0);
}

// =============================================================================
// Compensation Failure Tests
// =============================================================================

/// A compensation that fails is counted but the conflict is still reported.
#[tokio::test]
async fn test_failed_compensation_is_not_escalated() {
    let (store, model) = setup();
    let created = model
        .upsert_version(UpsertInput::create(fields(json!({"title": "A"})), None))
        .await
        .unwrap();

    store.fail(Op::Remove, "PageShadow");
    let err = model
        .upsert_version(UpsertInput::update(
            created.id.clone(),
            Some(VersionToken::from("stale")),
            fields(json!({"title": "B"})),
        ))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "VERSION_CONFLICT");
    let snapshot = model.metrics();
    assert_eq!(snapshot.compensation_failures, 1);
    assert_eq!(snapshot.compensations, 0);

    // The speculative record is left behind, unreferenced.
    assert_eq!(model.find_versions(&created.id).await.unwrap().versions.len(), 2);
    let active = model.find_active(&created.id).await.unwrap().unwrap();
    assert_eq!(active, created);
}

/// A failed conditional write on the primary undoes the speculative version.
#[tokio::test]
async fn test_failed_guarded_update_compensates() {
    let (store, model) = setup();
    let created = model
        .upsert_version(UpsertInput::create(fields(json!({"title": "A"})), None))
        .await
        .unwrap();

    store.fail(Op::ConditionalUpdate, "Page");
    let err = model
        .upsert_version(UpsertInput::update(
            created.id.clone(),
            Some(created.version_id.clone()),
            fields(json!({"title": "B"})),
        ))
        .await
        .unwrap_err();

    assert!(unavailable(&err));
    assert_eq!(model.find_versions(&created.id).await.unwrap().versions.len(), 1);
    assert_eq!(model.metrics().compensations, 1);
}
