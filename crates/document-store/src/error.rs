use thiserror::Error;

use crate::Collection;

/// Errors that can occur when interacting with the document store.
#[derive(Debug, Error)]
pub enum EntityStoreError {
    /// A point lookup by id matched zero documents.
    #[error("no document with id {id} in {collection}")]
    NotFound { collection: Collection, id: String },

    /// The store could not be reached or rejected the operation.
    #[error("store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    /// A stored document could not be decoded into the requested shape.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The caller cancelled the operation before the store replied.
    #[error("operation cancelled")]
    Cancelled,

    /// The operation did not complete before the caller's deadline.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// A document with the same primary id already exists in the collection.
    #[error("duplicate id {id} in {collection}")]
    DuplicateId { collection: Collection, id: String },

    /// The document is not a JSON object with a string `id` field.
    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

impl EntityStoreError {
    /// Returns true for the cancellation kind of failure (explicit cancel or deadline).
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }
}

/// Result type for document store operations.
pub type Result<T> = std::result::Result<T, EntityStoreError>;
