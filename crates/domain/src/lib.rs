//! Domain layer for the shop backend.
//!
//! This crate provides the in-memory model the services operate on:
//! - Value objects for money, discounts and identifiers
//! - The cart and its line items, with the add/remove mutator that keeps
//!   totals consistent
//! - Catalog records (items and categories) and their write payloads
//! - Item reviews
//! - The error taxonomy shared by the outer layers

pub mod cart;
pub mod catalog;
pub mod error;
pub mod review;
pub mod value_objects;

pub use cart::{Cart, CartError, LineItem};
pub use catalog::{
    CatalogError, Category, CategoryPatch, Item, ItemPatch, ItemSnapshot, NewCategory, NewItem,
    slugify,
};
pub use error::{DomainError, ErrorKind};
pub use review::{NewReview, Review, ReviewError};
pub use value_objects::{CartId, CategoryId, Discount, ItemId, Money, ReviewId, UserId};
