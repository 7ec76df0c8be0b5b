use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuakeError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("Corrupt cache payload: {0}")]
    CorruptPayload(String),

    #[error("Backing store error: {0}")]
    BackingStoreError(String),

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),
}

impl QuakeError {
    /// Whether this error belongs to the cache layer and must never reach a caller
    pub fn is_cache_fault(&self) -> bool {
        matches!(
            self,
            QuakeError::CacheUnavailable(_) | QuakeError::CorruptPayload(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, QuakeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_fault_classification() {
        assert!(QuakeError::CacheUnavailable("down".into()).is_cache_fault());
        assert!(QuakeError::CorruptPayload("bad".into()).is_cache_fault());
        assert!(!QuakeError::BackingStoreError("db".into()).is_cache_fault());
        assert!(!QuakeError::InvalidParameter("nan".into()).is_cache_fault());
    }

    #[test]
    fn test_error_display() {
        let err = QuakeError::BackingStoreError("connection refused".into());
        assert_eq!(err.to_string(), "Backing store error: connection refused");
    }
}
