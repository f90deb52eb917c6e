use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{DocumentId, Filter, Result, UpdateSpec};

/// Core trait for document store implementations.
///
/// Every operation addresses a single named collection. Writes are atomic per
/// document; there are no multi-document transactions.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns the first document matching the filter.
    ///
    /// Fails with `NotFound` when nothing matches.
    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Value>;

    /// Returns every document matching the filter, in insertion order.
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>>;

    /// Inserts a new document. The document must carry a valid `_id`.
    ///
    /// Fails with `DuplicateId` when the ID is already taken.
    async fn insert_one(&self, collection: &str, document: Value) -> Result<DocumentId>;

    /// Applies `update` atomically to the first document matching the filter.
    ///
    /// Fails with `NotFound` when nothing matches, which lets callers use
    /// range predicates as a write guard.
    async fn update_one(&self, collection: &str, filter: &Filter, update: &UpdateSpec)
    -> Result<()>;

    /// Deletes the first document matching the filter.
    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<()>;
}

/// Extension trait providing typed and convenience methods for document stores.
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    /// Checks whether any document matches the filter.
    async fn exists(&self, collection: &str, filter: &Filter) -> Result<bool> {
        match self.find_one(collection, filter).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Finds one document and deserializes it.
    async fn find_one_as<T>(&self, collection: &str, filter: &Filter) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        let document = self.find_one(collection, filter).await?;
        Ok(serde_json::from_value(document)?)
    }

    /// Finds one document if present and deserializes it.
    async fn find_optional_as<T>(&self, collection: &str, filter: &Filter) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.find_one_as(collection, filter).await {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Finds all matching documents and deserializes them.
    async fn find_as<T>(&self, collection: &str, filter: &Filter) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send,
    {
        self.find(collection, filter)
            .await?
            .into_iter()
            .map(|document| serde_json::from_value(document).map_err(Into::into))
            .collect()
    }

    /// Serializes a record and inserts it.
    async fn insert_as<T>(&self, collection: &str, record: &T) -> Result<DocumentId>
    where
        T: Serialize + Sync,
    {
        let document = serde_json::to_value(record)?;
        self.insert_one(collection, document).await
    }
}

// Blanket implementation for all DocumentStore implementations
impl<T: DocumentStore + ?Sized> DocumentStoreExt for T {}
