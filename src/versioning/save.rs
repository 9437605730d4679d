//! Version saves
//!
//! A save always persists the version record first and only then looks at
//! the active document. Outside append-only mode a save naming an existing
//! version overwrites it; in append-only mode every save inserts and the
//! named version is only the base the edit was made on.

use serde_json::Value;

use crate::observability::{log_event, Event, ObservationScope};
use crate::store::{Document, DocumentId, Fields, Filter, StoreError, UpdateOptions};

use super::errors::VersionResult;
use super::model::{finish, VersionedModel};
use super::types::{SaveVersionInput, VersionRecord};

impl VersionedModel {
    /// Persist a version and promote it if it is the active one.
    ///
    /// Returns the version record as finally persisted. Store errors
    /// propagate at the step that failed; earlier steps are not undone.
    pub async fn save_version(&self, input: SaveVersionInput) -> VersionResult<VersionRecord> {
        let entity = input.version_of_id.as_ref().map(DocumentId::to_string);
        let scope = ObservationScope::with_fields(
            "SAVE_VERSION",
            &[
                ("model", self.primary.name()),
                ("entity", entity.as_deref().unwrap_or("")),
                ("mode", self.config.mode.as_str()),
            ],
        );

        let result = if self.config.mode.is_append_only() {
            self.append_version(input).await
        } else {
            self.write_version(input).await
        };
        finish(scope, result)
    }

    /// Save `data` as a new, non-overwriting version of `entity`
    pub async fn save_new_version_of(
        &self,
        entity: &DocumentId,
        data: Fields,
    ) -> VersionResult<VersionRecord> {
        self.save_version(SaveVersionInput::new_version_of(entity.clone(), data))
            .await
    }

    async fn write_version(&self, input: SaveVersionInput) -> VersionResult<VersionRecord> {
        let SaveVersionInput {
            data,
            version_id,
            version_of_id,
        } = input;

        // Overwrite the named version, or start a new one.
        let existing = match &version_id {
            Some(token) => self.shadow.find_by_id(token.id()).await?,
            None => None,
        };
        let saved = match existing {
            Some(mut doc) => {
                for (name, value) in self.domain_data(&data) {
                    doc.set(name, value);
                }
                doc.set(
                    self.links_version_of(),
                    version_of_id
                        .as_ref()
                        .map_or(Value::Null, DocumentId::to_value),
                );
                self.shadow.update(doc).await?
            }
            None => {
                self.shadow
                    .insert(self.version_document(&data, version_of_id.as_ref()))
                    .await?
            }
        };
        let version = self.to_version_record(saved)?;
        self.metrics.increment_versions_saved();
        log_event(
            Event::VersionSaved,
            &[
                ("version_id", version.id.as_str()),
                ("overwrite", if version_id.is_some() { "true" } else { "false" }),
            ],
        );

        let Some(entity) = version_of_id else {
            return self.start_lineage(version).await;
        };
        if self.primary.find_by_id(&entity).await?.is_none() {
            return self.start_lineage(version).await;
        }

        // Promote only while the active document still points at this version.
        let guard = Filter::by_id(entity).where_eq(self.links_version_id(), version.id.to_value());
        let patch = self.promotion_patch(&version.data, &version.id);
        let promoted = self
            .primary
            .conditional_update(&guard, &patch, UpdateOptions::returning_new())
            .await?;

        if promoted.is_some() {
            self.mark_promoted(&version);
        } else {
            self.mark_historical(&version);
        }
        Ok(version)
    }

    async fn append_version(&self, input: SaveVersionInput) -> VersionResult<VersionRecord> {
        let SaveVersionInput {
            data,
            version_id: base,
            version_of_id,
        } = input;

        let saved = self
            .shadow
            .insert(self.version_document(&data, version_of_id.as_ref()))
            .await?;
        let version = self.to_version_record(saved)?;
        self.metrics.increment_versions_saved();
        log_event(
            Event::VersionSaved,
            &[("version_id", version.id.as_str()), ("overwrite", "false")],
        );

        let Some(entity) = version_of_id else {
            return self.start_lineage(version).await;
        };

        let Some(base) = base else {
            if self.primary.find_by_id(&entity).await?.is_some() {
                self.mark_historical(&version);
                return Ok(version);
            }
            return self.start_lineage(version).await;
        };

        // Advance the active pointer only if nobody moved it since `base`.
        let guard = Filter::by_id(entity).where_eq(self.links_version_id(), base.to_value());
        let patch = self.promotion_patch(&version.data, &version.id);
        let advanced = self
            .primary
            .conditional_update(&guard, &patch, UpdateOptions::returning_new())
            .await?;

        if advanced.is_some() {
            self.mark_promoted(&version);
        } else {
            self.mark_historical(&version);
        }
        Ok(version)
    }

    /// Create the active document for a version that has none, then point
    /// the version back at it.
    async fn start_lineage(&self, version: VersionRecord) -> VersionResult<VersionRecord> {
        let mut active = Document::new(version.data.clone());
        active.set(self.links_version_id(), version.id.to_value());
        let active = self.primary.insert(active).await?;
        let Some(active_id) = active.id else {
            return Err(StoreError::invalid(
                self.primary.name(),
                "store returned an active document without id",
            )
            .into());
        };

        log_event(
            Event::LineageCreated,
            &[
                ("entity", active_id.as_str()),
                ("version_id", version.id.as_str()),
            ],
        );
        self.mark_promoted(&version);

        if version.version_of.as_ref() == Some(&active_id) {
            return Ok(version);
        }
        self.link_version(&version.id, &active_id).await
    }

    fn mark_promoted(&self, version: &VersionRecord) {
        self.metrics.increment_promotions();
        log_event(Event::VersionPromoted, &[("version_id", version.id.as_str())]);
    }

    fn mark_historical(&self, version: &VersionRecord) {
        self.metrics.increment_historical_saves();
        log_event(Event::VersionHistorical, &[("version_id", version.id.as_str())]);
    }
}
