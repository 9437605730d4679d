//! # Document Store Errors

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors reported by a document store or a connection registry
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    // Registry errors
    #[error("Collection not registered: {0}")]
    CollectionNotFound(String),

    #[error("Collection already registered: {0}")]
    CollectionExists(String),

    // Document errors
    #[error("Document not found in {collection}: {id}")]
    DocumentNotFound { collection: String, id: String },

    #[error("Duplicate document id in {collection}: {id}")]
    DuplicateId { collection: String, id: String },

    #[error("Invalid document in {collection}: {reason}")]
    InvalidDocument { collection: String, reason: String },

    // Backend errors
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Create a not found error
    pub fn not_found(collection: impl Into<String>, id: impl ToString) -> Self {
        Self::DocumentNotFound {
            collection: collection.into(),
            id: id.to_string(),
        }
    }

    /// Create an invalid document error
    pub fn invalid(collection: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDocument {
            collection: collection.into(),
            reason: reason.into(),
        }
    }

    /// Get error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::CollectionNotFound(_) => "STORE_COLLECTION_NOT_FOUND",
            Self::CollectionExists(_) => "STORE_COLLECTION_EXISTS",
            Self::DocumentNotFound { .. } => "STORE_DOCUMENT_NOT_FOUND",
            Self::DuplicateId { .. } => "STORE_DUPLICATE_ID",
            Self::InvalidDocument { .. } => "STORE_INVALID_DOCUMENT",
            Self::Unavailable(_) => "STORE_UNAVAILABLE",
            Self::Internal(_) => "STORE_INTERNAL",
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Self::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(StoreError::CollectionExists("a".into()).code(), "STORE_COLLECTION_EXISTS");
        assert_eq!(StoreError::not_found("posts", "p1").code(), "STORE_DOCUMENT_NOT_FOUND");
        assert_eq!(StoreError::Unavailable("down".into()).code(), "STORE_UNAVAILABLE");
    }

    #[test]
    fn test_display_names_collection_and_id() {
        let err = StoreError::not_found("posts", "p1");
        let display = err.to_string();
        assert!(display.contains("posts"));
        assert!(display.contains("p1"));
    }
}
