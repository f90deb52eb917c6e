//! Engine error types.

use document_store::DocumentStoreError;
use domain::{CartError, CatalogError, DomainError, ErrorKind, ItemId, ReviewError};
use thiserror::Error;

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A referenced cart, item, category or review does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A cart or catalog rule was violated.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A guarded stock decrement found too few units left.
    #[error("not enough inventory for item {item_id}: requested {requested}")]
    StockExhausted { item_id: ItemId, requested: i64 },

    /// The document store failed.
    #[error("Document store error: {0}")]
    Store(#[from] DocumentStoreError),

    /// The inventory worker is gone or dropped the request.
    #[error("Inventory worker unavailable")]
    WorkerUnavailable,

    /// A concurrent task ended without reporting.
    #[error("Task aborted: {0}")]
    Aborted(String),
}

impl EngineError {
    /// Returns the error classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::NotFound(_) => ErrorKind::NotFound,
            EngineError::Domain(e) => e.kind(),
            EngineError::StockExhausted { .. } => ErrorKind::Validation,
            EngineError::Store(_) | EngineError::WorkerUnavailable | EngineError::Aborted(_) => {
                ErrorKind::Internal
            }
        }
    }

    pub(crate) fn not_found(role: &str, id: impl std::fmt::Display) -> Self {
        EngineError::NotFound(format!("{role} not found: {id}"))
    }
}

impl From<CartError> for EngineError {
    fn from(e: CartError) -> Self {
        EngineError::Domain(e.into())
    }
}

impl From<CatalogError> for EngineError {
    fn from(e: CatalogError) -> Self {
        EngineError::Domain(e.into())
    }
}

impl From<ReviewError> for EngineError {
    fn from(e: ReviewError) -> Self {
        EngineError::Domain(e.into())
    }
}

/// Convenience type alias for engine results.
pub type Result<T> = std::result::Result<T, EngineError>;
