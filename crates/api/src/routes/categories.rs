//! Catalog category endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use document_store::DocumentStore;
use domain::{Category, CategoryId, CategoryPatch, NewCategory};
use serde::Serialize;

use super::{AppState, parse_id};
use crate::error::ApiError;

#[derive(Serialize)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub parent_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id.to_string(),
            parent_ids: category.parent_ids.iter().map(ToString::to_string).collect(),
            name: category.name,
            slug: category.slug,
            description: category.description,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

/// POST /categories
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(payload): Json<NewCategory>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    let category = state.catalog.create_category(payload).await?;
    Ok((StatusCode::CREATED, Json(category.into())))
}

/// GET /categories
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = state.catalog.list_categories().await?;
    Ok(Json(
        categories.into_iter().map(CategoryResponse::from).collect(),
    ))
}

/// GET /categories/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let id: CategoryId = parse_id(&id, "category")?;
    Ok(Json(state.catalog.get_category(id).await?.into()))
}

/// PUT /categories/{id}
#[tracing::instrument(skip(state, patch))]
pub async fn update<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(patch): Json<CategoryPatch>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let id: CategoryId = parse_id(&id, "category")?;
    Ok(Json(state.catalog.update_category(id, patch).await?.into()))
}

/// DELETE /categories/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: CategoryId = parse_id(&id, "category")?;
    state.catalog.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
