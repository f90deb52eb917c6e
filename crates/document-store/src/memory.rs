use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{
    DocumentId, DocumentStoreError, Filter, Result, UpdateSpec, document_id_of,
    store::DocumentStore,
};

/// In-memory document store.
///
/// Collections keep documents in insertion order. The handle is cheap to
/// clone and all clones share the same data. Writes to a collection can be
/// made to fail on demand to exercise partial-failure paths.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<HashMap<String, Vec<Value>>>>,
    failing_writes: Arc<RwLock<HashSet<String>>>,
}

impl InMemoryDocumentStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of documents in a collection.
    pub async fn document_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }

    /// Makes every subsequent write to `collection` fail with `Unavailable`.
    pub async fn fail_writes_on(&self, collection: &str) {
        self.failing_writes
            .write()
            .await
            .insert(collection.to_string());
    }

    /// Restores normal write behaviour for all collections.
    pub async fn clear_faults(&self) {
        self.failing_writes.write().await.clear();
    }

    async fn check_writable(&self, collection: &str) -> Result<()> {
        if self.failing_writes.read().await.contains(collection) {
            return Err(DocumentStoreError::Unavailable(format!(
                "writes to '{collection}' are disabled"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Value> {
        let store = self.collections.read().await;
        store
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| filter.matches(doc)))
            .cloned()
            .ok_or_else(|| DocumentStoreError::not_found(collection))
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>> {
        let store = self.collections.read().await;
        Ok(store
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| filter.matches(doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert_one(&self, collection: &str, document: Value) -> Result<DocumentId> {
        self.check_writable(collection).await?;
        let id = document_id_of(&document)?;

        let mut store = self.collections.write().await;
        let docs = store.entry(collection.to_string()).or_default();

        // Unique constraint simulation
        let taken = docs
            .iter()
            .any(|doc| document_id_of(doc).is_ok_and(|existing| existing == id));
        if taken {
            return Err(DocumentStoreError::DuplicateId {
                collection: collection.to_string(),
                id,
            });
        }

        docs.push(document);
        Ok(id)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &UpdateSpec,
    ) -> Result<()> {
        self.check_writable(collection).await?;

        let mut store = self.collections.write().await;
        let document = store
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| filter.matches(doc)))
            .ok_or_else(|| DocumentStoreError::not_found(collection))?;

        update.apply(document)
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<()> {
        self.check_writable(collection).await?;

        let mut store = self.collections.write().await;
        let docs = store
            .get_mut(collection)
            .ok_or_else(|| DocumentStoreError::not_found(collection))?;
        let position = docs
            .iter()
            .position(|doc| filter.matches(doc))
            .ok_or_else(|| DocumentStoreError::not_found(collection))?;

        docs.remove(position);
        Ok(())
    }
}
