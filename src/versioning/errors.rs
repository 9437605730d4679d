//! # Versioning Errors

use thiserror::Error;

use crate::schema::SchemaError;
use crate::shadow::ShadowError;
use crate::store::{DocumentId, StoreError};

use super::token::VersionToken;

/// Result type for versioning operations
pub type VersionResult<T> = Result<T, VersionError>;

/// Errors surfaced by the version protocol
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VersionError {
    // Setup
    #[error("Configuration error: {0}")]
    Configuration(#[from] SchemaError),

    // Lookup
    #[error("Active document not found: {0}")]
    ActiveNotFound(DocumentId),

    #[error("Version record not found: {0}")]
    VersionNotFound(DocumentId),

    // Concurrency
    #[error("Version conflict on {entity}: expected {expected}, active is {actual}")]
    Conflict {
        entity: DocumentId,
        expected: VersionToken,
        actual: VersionToken,
    },

    #[error("A version token is required to {operation} {entity}")]
    TokenRequired {
        operation: &'static str,
        entity: DocumentId,
    },

    // Input
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    // Store
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<ShadowError> for VersionError {
    fn from(err: ShadowError) -> Self {
        match err {
            ShadowError::Schema(e) => Self::Configuration(e),
            ShadowError::Store(e) => Self::Store(e),
        }
    }
}

impl VersionError {
    /// Get error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(e) => e.code().code(),
            Self::ActiveNotFound(_) => "VERSION_ACTIVE_NOT_FOUND",
            Self::VersionNotFound(_) => "VERSION_NOT_FOUND",
            Self::Conflict { .. } => "VERSION_CONFLICT",
            Self::TokenRequired { .. } => "VERSION_TOKEN_REQUIRED",
            Self::InvalidSnapshot(_) => "VERSION_INVALID_SNAPSHOT",
            Self::Store(e) => e.code(),
        }
    }

    /// True for lookups that found nothing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ActiveNotFound(_) | Self::VersionNotFound(_))
    }

    /// True for version token mismatches and missing tokens
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::TokenRequired { .. })
    }

    /// Nothing in this crate retries automatically; callers decide.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_names_stale_token() {
        let err = VersionError::Conflict {
            entity: DocumentId::new("post-1"),
            expected: VersionToken::from("v1"),
            actual: VersionToken::from("v2"),
        };
        let display = err.to_string();
        assert!(display.contains("post-1"));
        assert!(display.contains("expected v1"));
        assert!(display.contains("active is v2"));
        assert!(err.is_conflict());
        assert_eq!(err.code(), "VERSION_CONFLICT");
    }

    #[test]
    fn test_codes_pass_through() {
        let store = VersionError::from(StoreError::Unavailable("down".into()));
        assert_eq!(store.code(), "STORE_UNAVAILABLE");

        let config = VersionError::from(SchemaError::link_field_collision("Post", "versionId"));
        assert_eq!(config.code(), "SCHEMA_LINK_FIELD_COLLISION");

        let shadow = VersionError::from(ShadowError::from(SchemaError::shadow_mismatch("P")));
        assert!(matches!(shadow, VersionError::Configuration(_)));
    }

    #[test]
    fn test_not_found_classification() {
        assert!(VersionError::ActiveNotFound(DocumentId::new("a")).is_not_found());
        assert!(VersionError::VersionNotFound(DocumentId::new("v")).is_not_found());
        assert!(!VersionError::InvalidSnapshot("x".into()).is_not_found());
        assert!(!VersionError::InvalidSnapshot("x".into()).is_retryable());
    }
}
