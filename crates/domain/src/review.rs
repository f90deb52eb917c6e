//! Item reviews: one star rating and text per author and item.

use chrono::{DateTime, Utc};
use common::DocumentId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ErrorKind;
use crate::value_objects::{ItemId, ReviewId, UserId};

/// Lowest accepted star rating.
pub const MIN_STARS: u8 = 1;
/// Highest accepted star rating.
pub const MAX_STARS: u8 = 5;

/// Errors that can occur while validating a review.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewError {
    #[error("invalid star rating: {stars} (must be between 1 and 5)")]
    InvalidStars { stars: i64 },
}

impl ReviewError {
    /// Returns the error classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReviewError::InvalidStars { .. } => ErrorKind::Validation,
        }
    }
}

/// A shopper's review of a catalog item.
///
/// An author holds at most one review per item; posting again revises it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: ReviewId,
    pub item_id: ItemId,
    pub author_id: UserId,
    pub stars: u8,
    #[serde(default)]
    pub content: String,
    /// Hides the author from readers of the review.
    #[serde(default)]
    pub anonymous: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    /// Returns the id of the review `author_id` holds for `item_id`.
    ///
    /// The id is name-derived, so concurrent first posts by one author
    /// collide on insert instead of creating two reviews.
    pub fn id_for(item_id: ItemId, author_id: UserId) -> ReviewId {
        let author = author_id.document_id().as_uuid();
        DocumentId::derived(item_id.document_id(), author.as_bytes()).into()
    }

    /// Builds a new review from a payload.
    pub fn create(
        item_id: ItemId,
        author_id: UserId,
        payload: NewReview,
        now: DateTime<Utc>,
    ) -> Result<Self, ReviewError> {
        let stars = payload.validate()?;
        Ok(Self {
            id: Self::id_for(item_id, author_id),
            item_id,
            author_id,
            stars,
            content: payload.content,
            anonymous: payload.anonymous,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces rating, text and visibility; leaves the review untouched on error.
    pub fn revise(&mut self, payload: NewReview, now: DateTime<Utc>) -> Result<(), ReviewError> {
        self.stars = payload.validate()?;
        self.content = payload.content;
        self.anonymous = payload.anonymous;
        self.updated_at = now;
        Ok(())
    }
}

/// Payload for posting a review.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewReview {
    pub stars: i64,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub anonymous: bool,
}

impl NewReview {
    /// Checks the rating and returns it narrowed to its stored width.
    pub fn validate(&self) -> Result<u8, ReviewError> {
        u8::try_from(self.stars)
            .ok()
            .filter(|stars| (MIN_STARS..=MAX_STARS).contains(stars))
            .ok_or(ReviewError::InvalidStars { stars: self.stars })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(stars: i64) -> NewReview {
        NewReview {
            stars,
            content: "Sturdy and cheap".to_string(),
            anonymous: false,
        }
    }

    #[test]
    fn test_star_bounds() {
        assert_eq!(payload(1).validate(), Ok(1));
        assert_eq!(payload(5).validate(), Ok(5));
        for stars in [0, 6, -1, 256] {
            assert_eq!(
                payload(stars).validate(),
                Err(ReviewError::InvalidStars { stars })
            );
        }
    }

    #[test]
    fn test_review_id_is_per_author_and_item() {
        let item = ItemId::new();
        let author = UserId::new();

        assert_eq!(Review::id_for(item, author), Review::id_for(item, author));
        assert_ne!(Review::id_for(item, author), Review::id_for(item, UserId::new()));
        assert_ne!(Review::id_for(item, author), Review::id_for(ItemId::new(), author));
    }

    #[test]
    fn test_revise_keeps_identity() {
        let created = Utc::now();
        let mut review = Review::create(ItemId::new(), UserId::new(), payload(4), created).unwrap();
        let id = review.id;

        let later = created + chrono::Duration::minutes(5);
        review
            .revise(
                NewReview {
                    stars: 2,
                    content: "Broke after a week".to_string(),
                    anonymous: true,
                },
                later,
            )
            .unwrap();

        assert_eq!(review.id, id);
        assert_eq!(review.stars, 2);
        assert!(review.anonymous);
        assert_eq!(review.created_at, created);
        assert_eq!(review.updated_at, later);
    }

    #[test]
    fn test_invalid_revision_leaves_review_untouched() {
        let mut review = Review::create(ItemId::new(), UserId::new(), payload(4), Utc::now()).unwrap();
        let before = review.clone();

        assert!(review.revise(payload(9), Utc::now()).is_err());
        assert_eq!(review, before);
    }

    #[test]
    fn test_review_document_shape() {
        let review = Review::create(ItemId::new(), UserId::new(), payload(3), Utc::now()).unwrap();

        let json = serde_json::to_value(&review).unwrap();
        assert_eq!(json["_id"], review.id.to_string());
        assert_eq!(json["item_id"], review.item_id.to_string());
        assert_eq!(json["stars"], 3);

        let back: Review = serde_json::from_value(json).unwrap();
        assert_eq!(back, review);
    }
}
