//! Shared identifier types used across the shop backend crates.

mod types;

pub use types::DocumentId;

#[doc(hidden)]
pub use uuid::Uuid;
