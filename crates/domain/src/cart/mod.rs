//! Cart model and the mutator that keeps line items and totals consistent.

mod model;

pub use model::{Cart, LineItem};

use thiserror::Error;

use crate::error::ErrorKind;
use crate::value_objects::ItemId;

/// Errors that can occur while mutating a cart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Quantities must be positive.
    #[error("invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: i64 },

    /// More units were requested than the item currently has.
    #[error("not enough inventory for item {item_id}: requested {requested}, available {available}")]
    InsufficientInventory {
        item_id: ItemId,
        requested: u32,
        available: i64,
    },

    /// The cart holds no line for the item.
    #[error("item not found in cart: {item_id}")]
    ItemNotInCart { item_id: ItemId },

    /// More units were removed than the line holds.
    #[error("cannot remove more than present: requested {requested}, present {present}")]
    RemoveExceedsQuantity { requested: u32, present: u32 },

    /// A line quantity, line total or cart total would leave the supported range.
    #[error("amount out of range for item {item_id}")]
    AmountOverflow { item_id: ItemId },
}

impl CartError {
    /// Returns the error classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CartError::ItemNotInCart { .. } => ErrorKind::NotFound,
            CartError::InvalidQuantity { .. }
            | CartError::InsufficientInventory { .. }
            | CartError::RemoveExceedsQuantity { .. }
            | CartError::AmountOverflow { .. } => ErrorKind::Validation,
        }
    }
}
