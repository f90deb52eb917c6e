//! Item reviews. Posting twice for the same item revises the author's review.

use chrono::Utc;
use document_store::{DocumentStore, DocumentStoreError};
use domain::{ItemId, NewReview, Review, ReviewId, UserId};

use crate::error::{EngineError, Result};
use crate::repository::{ItemRepository, ReviewRepository};

#[derive(Clone)]
pub struct ReviewService<S> {
    items: ItemRepository<S>,
    reviews: ReviewRepository<S>,
}

impl<S> ReviewService<S>
where
    S: DocumentStore + Clone + 'static,
{
    pub fn new(store: S) -> Self {
        Self {
            items: ItemRepository::new(store.clone()),
            reviews: ReviewRepository::new(store),
        }
    }

    /// Creates the author's review of an item, or revises it in place if one
    /// already exists.
    #[tracing::instrument(skip(self, payload), fields(stars = payload.stars))]
    pub async fn post_review(
        &self,
        author_id: UserId,
        item_id: ItemId,
        payload: NewReview,
    ) -> Result<Review> {
        payload.validate()?;
        if !self.items.exists(item_id).await? {
            return Err(EngineError::not_found("item", item_id));
        }

        let review_id = Review::id_for(item_id, author_id);
        if let Some(existing) = self.reviews.get(review_id).await? {
            return self.revise(existing, payload).await;
        }

        let review = Review::create(item_id, author_id, payload.clone(), Utc::now())?;
        match self.reviews.insert(&review).await {
            Ok(()) => {
                metrics::counter!("reviews_posted_total", "operation" => "create").increment(1);
                tracing::info!(review_id = %review.id, "review created");
                Ok(review)
            }
            Err(DocumentStoreError::DuplicateId { .. }) => {
                let existing = self
                    .reviews
                    .get(review_id)
                    .await?
                    .ok_or_else(|| EngineError::not_found("review", review_id))?;
                self.revise(existing, payload).await
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn revise(&self, mut review: Review, payload: NewReview) -> Result<Review> {
        review.revise(payload, Utc::now())?;
        self.reviews.save(&review).await?;
        metrics::counter!("reviews_posted_total", "operation" => "revise").increment(1);
        tracing::info!(review_id = %review.id, "review revised");
        Ok(review)
    }

    pub async fn get_review(&self, id: ReviewId) -> Result<Review> {
        self.reviews
            .get(id)
            .await?
            .ok_or_else(|| EngineError::not_found("review", id))
    }

    /// Lists an item's reviews, oldest first.
    pub async fn list_reviews(&self, item_id: ItemId) -> Result<Vec<Review>> {
        if !self.items.exists(item_id).await? {
            return Err(EngineError::not_found("item", item_id));
        }
        let mut reviews = self.reviews.list_for_item(item_id).await?;
        reviews.sort_by_key(|review| review.created_at);
        Ok(reviews)
    }
}
