use std::error::Error;

use thiserror::Error;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Error raised by document store backends regardless of the underlying
/// engine.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced document does not exist.
    #[error("document `{collection}/{id}` not found")]
    NotFound {
        /// Collection that was addressed.
        collection: String,
        /// Document identifier that was addressed.
        id: String,
    },
    /// Creation was attempted for a document that already exists.
    #[error("document `{collection}/{id}` already exists")]
    AlreadyExists {
        /// Collection that was addressed.
        collection: String,
        /// Document identifier that was addressed.
        id: String,
    },
    /// The backend failed or is unreachable.
    #[error("store unavailable: {message}")]
    Unavailable {
        /// Human-readable description of the failure.
        message: String,
        /// Underlying backend error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl StoreError {
    /// Construct a not-found error for `collection/id`.
    pub fn not_found(collection: &str, id: &str) -> Self {
        StoreError::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Construct an already-exists error for `collection/id`.
    pub fn already_exists(collection: &str, id: &str) -> Self {
        StoreError::AlreadyExists {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StoreError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
