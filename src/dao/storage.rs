use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or the operation failed outright.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Human-readable description of the failing operation.
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A compare-and-swap missed or a uniqueness constraint rejected the
    /// write. Callers re-read current state before retrying.
    #[error("storage conflict: {message}")]
    Conflict {
        /// Which write was rejected and why.
        message: String,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a conflict error for a rejected concurrent write.
    pub fn conflict(message: impl Into<String>) -> Self {
        StorageError::Conflict {
            message: message.into(),
        }
    }

    /// Whether this error is a concurrency conflict rather than an outage.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StorageError::Conflict { .. })
    }
}
