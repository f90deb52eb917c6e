//! Item review endpoints. Posting requires the `x-user-id` header.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use document_store::DocumentStore;
use domain::{ItemId, NewReview, Review, ReviewId};
use serde::Serialize;

use super::cart::CurrentUser;
use super::{AppState, parse_id};
use crate::error::ApiError;

#[derive(Serialize)]
pub struct ReviewResponse {
    pub id: String,
    pub item_id: String,
    /// Omitted for anonymous reviews.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    pub stars: u8,
    pub content: String,
    pub anonymous: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: review.id.to_string(),
            item_id: review.item_id.to_string(),
            author_id: (!review.anonymous).then(|| review.author_id.to_string()),
            stars: review.stars,
            content: review.content,
            anonymous: review.anonymous,
            created_at: review.created_at,
            updated_at: review.updated_at,
        }
    }
}

/// POST /items/{id}/reviews: create or revise the caller's review.
#[tracing::instrument(skip(state, user, payload), fields(user_id = %user.0))]
pub async fn post<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<NewReview>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let item_id: ItemId = parse_id(&id, "item")?;
    let review = state.reviews.post_review(user.0, item_id, payload).await?;
    Ok(Json(review.into()))
}

/// GET /items/{id}/reviews
#[tracing::instrument(skip(state))]
pub async fn list_for_item<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ReviewResponse>>, ApiError> {
    let item_id: ItemId = parse_id(&id, "item")?;
    let reviews = state.reviews.list_reviews(item_id).await?;
    Ok(Json(reviews.into_iter().map(ReviewResponse::from).collect()))
}

/// GET /reviews/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let id: ReviewId = parse_id(&id, "review")?;
    Ok(Json(state.reviews.get_review(id).await?.into()))
}
