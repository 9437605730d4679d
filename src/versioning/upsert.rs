//! Guarded create-or-update
//!
//! Both paths write a speculative version record first and then make one
//! conditional write against the primary collection. The conditional write
//! decides the outcome; a speculative record that lost is deleted again on a
//! best-effort basis.

use crate::observability::{log_event, Event, ObservationScope};
use crate::store::{Document, DocumentId, Fields, Filter, Patch, StoreError, UpdateOptions};

use super::errors::{VersionError, VersionResult};
use super::model::{finish, VersionedModel};
use super::token::VersionToken;
use super::types::{ActiveDocument, UpsertInput, VersionRecord};

impl VersionedModel {
    /// Create or replace an entity under an optimistic guard.
    ///
    /// Without an id, racing creators that pass the same `query` collapse
    /// onto one active document and every caller gets that document back.
    /// With an id, the update only applies while the active pointer still
    /// equals `version_id`.
    pub async fn upsert_version(&self, input: UpsertInput) -> VersionResult<ActiveDocument> {
        let entity = input.id.as_ref().map(DocumentId::to_string);
        let scope = ObservationScope::with_fields(
            "UPSERT_VERSION",
            &[
                ("model", self.primary.name()),
                ("entity", entity.as_deref().unwrap_or("")),
            ],
        );

        let UpsertInput {
            id,
            data,
            version_id,
            query,
        } = input;
        let result = match id {
            Some(id) => self.upsert_existing(id, data, version_id).await,
            None => self.upsert_new(data, query).await,
        };
        finish(scope, result)
    }

    async fn upsert_new(&self, data: Fields, query: Option<Filter>) -> VersionResult<ActiveDocument> {
        let version = self.insert_speculative(&data, None).await?;

        let Some(query) = query else {
            let mut doc = Document::new(version.data.clone());
            doc.set(self.links_version_id(), version.id.to_value());
            let inserted = self.primary.insert(doc).await?;
            let active = self.to_active(inserted)?;
            self.link_version(&version.id, &active.id).await?;
            self.metrics.increment_promotions();
            log_event(
                Event::LineageCreated,
                &[
                    ("entity", active.id.as_str()),
                    ("version_id", version.id.as_str()),
                ],
            );
            return Ok(active);
        };

        let mut seed = version.data.clone();
        seed.insert(self.links_version_id().to_string(), version.id.to_value());
        let patch = Patch::new().set_all_on_insert(seed);
        let outcome = self
            .primary
            .conditional_update(&query, &patch, UpdateOptions::upsert_returning_new())
            .await;

        let doc = match outcome {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                self.compensate_delete(&version.id, "upsert_no_result").await;
                return Err(StoreError::invalid(
                    self.primary.name(),
                    "upsert returned no document",
                )
                .into());
            }
            Err(e) => {
                self.compensate_delete(&version.id, "upsert_failed").await;
                return Err(e.into());
            }
        };
        let winner = self.to_active(doc)?;

        if !winner.version_id.names(&version.id) {
            log_event(
                Event::UpsertCollapsed,
                &[
                    ("entity", winner.id.as_str()),
                    ("winner", winner.version_id.id().as_str()),
                    ("loser", version.id.as_str()),
                ],
            );
            self.compensate_delete(&version.id, "upsert_lost_race").await;
            return Ok(winner);
        }

        self.link_version(&version.id, &winner.id).await?;
        self.metrics.increment_promotions();
        log_event(
            Event::LineageCreated,
            &[
                ("entity", winner.id.as_str()),
                ("version_id", version.id.as_str()),
            ],
        );
        Ok(winner)
    }

    async fn upsert_existing(
        &self,
        id: DocumentId,
        data: Fields,
        token: Option<VersionToken>,
    ) -> VersionResult<ActiveDocument> {
        if token.is_none() && self.config.mode.requires_token() {
            return Err(VersionError::TokenRequired {
                operation: "update",
                entity: id,
            });
        }

        let version = self.insert_speculative(&data, Some(&id)).await?;

        let mut guard = Filter::by_id(id.clone());
        if let Some(token) = &token {
            guard = guard.where_eq(self.links_version_id(), token.to_value());
        }
        let patch = self.promotion_patch(&version.data, &version.id);
        let updated = match self
            .primary
            .conditional_update(&guard, &patch, UpdateOptions::returning_new())
            .await
        {
            Ok(updated) => updated,
            Err(e) => {
                self.compensate_delete(&version.id, "upsert_failed").await;
                return Err(e.into());
            }
        };

        if let Some(doc) = updated {
            self.metrics.increment_promotions();
            log_event(
                Event::VersionPromoted,
                &[("entity", id.as_str()), ("version_id", version.id.as_str())],
            );
            return self.to_active(doc);
        }

        self.compensate_delete(&version.id, "upsert_guard_failed").await;
        match (self.find_active(&id).await?, token) {
            (Some(current), Some(expected)) => Err(self.conflict(&id, expected, current.version_id)),
            _ => Err(VersionError::ActiveNotFound(id)),
        }
    }

    async fn insert_speculative(
        &self,
        data: &Fields,
        version_of: Option<&DocumentId>,
    ) -> VersionResult<VersionRecord> {
        let saved = self
            .shadow
            .insert(self.version_document(data, version_of))
            .await?;
        let version = self.to_version_record(saved)?;
        self.metrics.increment_versions_saved();
        log_event(Event::VersionSaved, &[("version_id", version.id.as_str())]);
        Ok(version)
    }
}
