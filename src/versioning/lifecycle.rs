//! Version lifecycle: deletion, activation and soft deletion of the active
//! document
//!
//! None of these run in a transaction. `delete_version` checks and then
//! acts, so an activation racing with it can still lose its target.
//! `delete_original` closes that gap for the active document by removing it
//! only while its pointer still equals the token that was checked.

use serde_json::Value;

use crate::observability::{log_event, Event, ObservationScope};
use crate::store::{DocumentId, Filter, Patch, UpdateOptions};

use super::config::VersioningMode;
use super::errors::{VersionError, VersionResult};
use super::model::{finish, VersionedModel};
use super::token::VersionToken;
use super::types::{ActiveDocument, DeleteOutcome, VersionRecord};

impl VersionedModel {
    /// Delete a version record unless an active document points at it.
    ///
    /// Both refusal and a missing record yield `success == false`.
    pub async fn delete_version(&self, version: &DocumentId) -> VersionResult<DeleteOutcome> {
        let scope = ObservationScope::with_fields(
            "DELETE_VERSION",
            &[("model", self.primary.name()), ("version_id", version.as_str())],
        );
        let result = self.remove_inactive_version(version).await;
        finish(scope, result)
    }

    async fn remove_inactive_version(&self, version: &DocumentId) -> VersionResult<DeleteOutcome> {
        let referenced = Filter::new().where_eq(self.links_version_id(), version.to_value());
        if self.primary.find_one(&referenced).await?.is_some() {
            self.metrics.increment_deletes_refused();
            log_event(
                Event::VersionDeleteRefused,
                &[("version_id", version.as_str()), ("reason", "active")],
            );
            return Ok(DeleteOutcome::refused());
        }

        if self.shadow.find_by_id(version).await?.is_none() {
            return Ok(DeleteOutcome::refused());
        }

        let removed = self.shadow.remove(&Filter::by_id(version.clone())).await?;
        if removed == 0 {
            return Ok(DeleteOutcome::refused());
        }

        self.metrics.increment_versions_deleted();
        log_event(Event::VersionDeleted, &[("version_id", version.as_str())]);
        Ok(DeleteOutcome::deleted())
    }

    /// Copy a version onto its active document and point the document at it
    pub async fn activate_version(&self, version: &DocumentId) -> VersionResult<ActiveDocument> {
        let scope = ObservationScope::with_fields(
            "ACTIVATE_VERSION",
            &[("model", self.primary.name()), ("version_id", version.as_str())],
        );
        let result = self.promote_existing(version).await;
        finish(scope, result)
    }

    async fn promote_existing(&self, version: &DocumentId) -> VersionResult<ActiveDocument> {
        let record = self
            .find_version_by_id(version)
            .await?
            .ok_or_else(|| VersionError::VersionNotFound(version.clone()))?;

        // An orphaned version has no active document to activate into.
        let entity = record
            .version_of
            .clone()
            .ok_or_else(|| VersionError::ActiveNotFound(record.id.clone()))?;
        let mut active = self
            .primary
            .find_by_id(&entity)
            .await?
            .ok_or_else(|| VersionError::ActiveNotFound(entity.clone()))?;

        let previous = active
            .get(self.links_version_id())
            .cloned()
            .unwrap_or(Value::Null);
        self.replace_domain(&mut active, &record.data);
        active.set(self.links_version_id(), record.id.to_value());
        let saved = self.primary.update(active).await?;

        self.metrics.increment_activations();
        let previous = previous.as_str().unwrap_or("").to_string();
        log_event(
            Event::VersionActivated,
            &[
                ("entity", entity.as_str()),
                ("version_id", record.id.as_str()),
                ("previous", previous.as_str()),
            ],
        );
        self.to_active(saved)
    }

    /// Soft-delete an active document, keeping its last state as a terminal
    /// version record.
    ///
    /// `expected` is the version the caller last saw active. It may be
    /// omitted only in append-only mode; when given it must match.
    pub async fn delete_original(
        &self,
        entity: &DocumentId,
        expected: Option<VersionToken>,
    ) -> VersionResult<VersionRecord> {
        let scope = ObservationScope::with_fields(
            "DELETE_ORIGINAL",
            &[
                ("model", self.primary.name()),
                ("entity", entity.as_str()),
                ("mode", self.config.mode.as_str()),
            ],
        );
        let result = self.retire_active(entity, expected).await;
        finish(scope, result)
    }

    async fn retire_active(
        &self,
        entity: &DocumentId,
        expected: Option<VersionToken>,
    ) -> VersionResult<VersionRecord> {
        let active = self
            .find_active(entity)
            .await?
            .ok_or_else(|| VersionError::ActiveNotFound(entity.clone()))?;

        match expected {
            Some(token) if token != active.version_id => {
                return Err(self.conflict(entity, token, active.version_id));
            }
            None if self.config.mode.requires_token() => {
                return Err(VersionError::TokenRequired {
                    operation: "delete",
                    entity: entity.clone(),
                });
            }
            _ => {}
        }

        let (terminal, flagged_in_place) = self.write_terminal(&active).await?;

        let guard = Filter::by_id(active.id.clone())
            .where_eq(self.links_version_id(), active.version_id.to_value());
        if self.primary.remove(&guard).await? == 0 {
            if flagged_in_place {
                self.compensate_unflag(&terminal.id, "delete_original_lost_race")
                    .await;
            } else {
                self.compensate_delete(&terminal.id, "delete_original_lost_race")
                    .await;
            }

            return match self.find_active(entity).await? {
                Some(current) => Err(self.conflict(entity, active.version_id, current.version_id)),
                None => Err(VersionError::ActiveNotFound(entity.clone())),
            };
        }

        self.metrics.increment_originals_deleted();
        log_event(
            Event::OriginalDeleted,
            &[
                ("entity", entity.as_str()),
                ("terminal_version", terminal.id.as_str()),
            ],
        );
        Ok(terminal)
    }

    /// Write the terminal record. Returns it and whether an existing record
    /// was flagged instead of a new one inserted.
    async fn write_terminal(&self, active: &ActiveDocument) -> VersionResult<(VersionRecord, bool)> {
        if self.config.mode == VersioningMode::Flagged {
            let patch = Patch::new().set(self.links_delete_flag(), true);
            let flagged = self
                .shadow
                .conditional_update(
                    &Filter::by_id(active.version_id.id().clone()),
                    &patch,
                    UpdateOptions::returning_new(),
                )
                .await?;
            if let Some(doc) = flagged {
                return Ok((self.to_version_record(doc)?, true));
            }
            // The active record is gone; fall back to a fresh terminal record.
        }

        let mut doc = self.version_document(&active.data, Some(&active.id));
        doc.set(self.links_delete_flag(), Value::Bool(true));
        let saved = self.shadow.insert(doc).await?;
        self.metrics.increment_versions_saved();
        Ok((self.to_version_record(saved)?, false))
    }
}
