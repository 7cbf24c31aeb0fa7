//! Domain error types.

use document_store::EntityStoreError;
use thiserror::Error;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the document store.
    #[error("{0}")]
    Store(#[from] EntityStoreError),

    /// A point lookup by id matched nothing.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// An inbound payload is not valid structured data.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl DomainError {
    /// Returns true for the not-found kind, whichever layer raised it.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::Store(EntityStoreError::NotFound { .. })
        )
    }

    /// Returns true for the cancellation kind (cancelled or deadline exceeded).
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_cancellation())
    }
}
