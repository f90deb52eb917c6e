//! HTTP route handlers.

pub mod cart;
pub mod categories;
pub mod health;
pub mod items;
pub mod metrics;
pub mod reviews;

use std::str::FromStr;

use engine::{CartService, CatalogService, DualWritePolicy, ReviewService, StockPolicy};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S> {
    pub carts: CartService<S>,
    pub catalog: CatalogService<S>,
    pub reviews: ReviewService<S>,
    pub stock_policy: StockPolicy,
    pub dual_write_policy: DualWritePolicy,
}

/// Parses a path segment into a typed identifier.
pub(crate) fn parse_id<T>(raw: &str, what: &str) -> Result<T, ApiError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid {what} id: {e}")))
}
