//! Shadow resolution errors

use thiserror::Error;

use crate::schema::SchemaError;
use crate::store::StoreError;

/// Result type for shadow resolution
pub type ShadowResult<T> = Result<T, ShadowError>;

/// Why a shadow collection could not be resolved on a connection
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShadowError {
    /// The shadow name is registered with an incompatible shape
    #[error("{0}")]
    Schema(#[from] SchemaError),

    #[error("{0}")]
    Store(#[from] StoreError),
}

impl ShadowError {
    /// Error code of the underlying failure
    pub fn code(&self) -> &'static str {
        match self {
            Self::Schema(e) => e.code().code(),
            Self::Store(e) => e.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_pass_through() {
        let err = ShadowError::from(SchemaError::shadow_mismatch("PostShadow"));
        assert_eq!(err.code(), "SCHEMA_SHADOW_MISMATCH");
        assert!(err.to_string().contains("PostShadow"));

        let err = ShadowError::from(StoreError::Unavailable("down".into()));
        assert_eq!(err.code(), "STORE_UNAVAILABLE");
    }
}
