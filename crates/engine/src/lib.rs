//! Cart-inventory consistency engine.
//!
//! Carts and item stock live in separate documents and are written without a
//! cross-document transaction. This crate coordinates them:
//! 1. A single inventory worker applies every stock delta one at a time
//! 2. The cart mutator recomputes lines and totals in memory
//! 3. The dual-write coordinator persists the cart and drives the worker
//!    concurrently, optionally compensating a half-applied write
//!
//! It also hosts the validation fan-out used by catalog writes to check that
//! referenced records exist, and the item review service.

pub mod cart_service;
pub mod catalog_service;
pub mod coordinator;
pub mod error;
pub mod fanout;
pub mod inventory;
pub mod policy;
pub mod repository;
pub mod review_service;

pub use cart_service::CartService;
pub use catalog_service::CatalogService;
pub use coordinator::{Branch, DualWriteCoordinator};
pub use error::EngineError;
pub use fanout::{verify_all_exist, verify_all_exist_collect};
pub use inventory::{InventoryActor, InventoryHandle};
pub use policy::{DualWritePolicy, StockPolicy};
pub use repository::{CartRepository, CategoryRepository, ItemRepository, ReviewRepository};
pub use review_service::ReviewService;
