//! Domain error types.

use thiserror::Error;

use crate::cart::CartError;
use crate::catalog::CatalogError;
use crate::review::ReviewError;

/// Coarse classification of a failure, used to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A referenced cart, item, category or review does not exist.
    NotFound,
    /// The request is well-formed but violates a business rule.
    Validation,
    /// Storage or worker communication failed.
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::NotFound => write!(f, "not found"),
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::Internal => write!(f, "internal"),
        }
    }
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred while mutating a cart.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// An error occurred while validating a catalog write.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// An error occurred while validating a review.
    #[error(transparent)]
    Review(#[from] ReviewError),
}

impl DomainError {
    /// Returns the error classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Cart(e) => e.kind(),
            DomainError::Catalog(e) => e.kind(),
            DomainError::Review(e) => e.kind(),
        }
    }
}
