use thiserror::Error;

use crate::DocumentId;

/// Errors that can occur when interacting with the document store.
#[derive(Debug, Error)]
pub enum DocumentStoreError {
    /// No document in the collection matched the filter.
    #[error("No document matched in collection '{collection}'")]
    NotFound { collection: String },

    /// A document with the same ID already exists in the collection.
    #[error("Duplicate document {id} in collection '{collection}'")]
    DuplicateId { collection: String, id: DocumentId },

    /// The document is not a JSON object or lacks a valid `_id`.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// The update could not be applied to the matched document.
    #[error("Invalid update: {0}")]
    InvalidUpdate(String),

    /// The backend refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DocumentStoreError {
    /// Returns true if this error means "nothing matched".
    pub fn is_not_found(&self) -> bool {
        matches!(self, DocumentStoreError::NotFound { .. })
    }

    pub(crate) fn not_found(collection: &str) -> Self {
        DocumentStoreError::NotFound {
            collection: collection.to_string(),
        }
    }
}

/// Result type for document store operations.
pub type Result<T> = std::result::Result<T, DocumentStoreError>;
