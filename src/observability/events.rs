//! Observable events of the versioning protocol
//!
//! Events are explicit and typed. Each carries its own severity so call
//! sites never pick one ad hoc.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Setup
    /// Versioned model bound to a connection
    ModelBound,
    /// Shadow collection registered on a connection
    ShadowRegistered,
    /// Shadow collection already registered, adopted
    ShadowAdopted,

    // Saves
    /// Version record persisted
    VersionSaved,
    /// Saved version copied onto the active document
    VersionPromoted,
    /// Saved version left as history (not the active version)
    VersionHistorical,
    /// First save created a new active document
    LineageCreated,

    // Activation and deletion
    /// Active pointer switched to another version
    VersionActivated,
    /// Non-active version removed
    VersionDeleted,
    /// Deletion of the active version refused
    VersionDeleteRefused,
    /// Active document removed, terminal version kept
    OriginalDeleted,

    // Concurrency
    /// Supplied version token did not match
    ConcurrencyConflict,
    /// Racing creators collapsed onto one active document
    UpsertCollapsed,

    // Compensation
    /// Speculative write undone
    CompensationApplied,
    /// Speculative write could not be undone
    CompensationFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ModelBound => "MODEL_BOUND",
            Event::ShadowRegistered => "SHADOW_REGISTERED",
            Event::ShadowAdopted => "SHADOW_ADOPTED",

            Event::VersionSaved => "VERSION_SAVED",
            Event::VersionPromoted => "VERSION_PROMOTED",
            Event::VersionHistorical => "VERSION_HISTORICAL",
            Event::LineageCreated => "LINEAGE_CREATED",

            Event::VersionActivated => "VERSION_ACTIVATED",
            Event::VersionDeleted => "VERSION_DELETED",
            Event::VersionDeleteRefused => "VERSION_DELETE_REFUSED",
            Event::OriginalDeleted => "ORIGINAL_DELETED",

            Event::ConcurrencyConflict => "CONCURRENCY_CONFLICT",
            Event::UpsertCollapsed => "UPSERT_COLLAPSED",

            Event::CompensationApplied => "COMPENSATION_APPLIED",
            Event::CompensationFailed => "COMPENSATION_FAILED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::VersionSaved | Event::VersionHistorical | Event::ShadowAdopted => {
                Severity::Trace
            }
            Event::ConcurrencyConflict | Event::CompensationFailed => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
