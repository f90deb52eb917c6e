//! Catalog records: items, categories and their write payloads.

mod category;
mod item;

pub use category::{Category, CategoryPatch, NewCategory};
pub use item::{Item, ItemPatch, ItemSnapshot, NewItem};

use thiserror::Error;

use crate::error::ErrorKind;

/// Errors raised while validating catalog writes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    /// Names must not be blank.
    #[error("name is required")]
    NameRequired,

    /// Prices must be positive.
    #[error("invalid price: {cents} cents (must be greater than 0)")]
    InvalidPrice { cents: i64 },

    /// Stock quantities must not be negative.
    #[error("invalid quantity: {quantity} (must not be negative)")]
    InvalidQuantity { quantity: i64 },

    /// A category with the same name already exists.
    #[error("category already exists: {name}")]
    CategoryAlreadyExists { name: String },

    /// A category may not list itself as a parent.
    #[error("category cannot be its own parent")]
    SelfParent,
}

impl CatalogError {
    /// Returns the error classification.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

/// Derives a URL slug from a display name.
///
/// Lowercases ASCII alphanumerics and collapses every other run of
/// characters into a single hyphen.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}
