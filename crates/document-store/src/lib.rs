//! Document storage for the shop backend.
//!
//! Documents are JSON objects grouped into named collections and keyed by the
//! [`DocumentId`] stored in their `_id` field. The [`DocumentStore`] trait
//! exposes the narrow find/insert/update/delete surface the services need,
//! including atomic numeric increments through [`UpdateSpec`].

pub mod error;
pub mod filter;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::DocumentId;
pub use error::{DocumentStoreError, Result};
pub use filter::{Filter, UpdateSpec, document_id_of};
pub use memory::InMemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use store::{DocumentStore, DocumentStoreExt};

/// Name of the field holding a document's identity.
pub const ID_FIELD: &str = "_id";
