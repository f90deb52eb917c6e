//! Catalog item endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use document_store::DocumentStore;
use domain::{Item, ItemId, ItemPatch, NewItem};
use serde::Serialize;

use super::{AppState, parse_id};
use crate::error::ApiError;

#[derive(Serialize)]
pub struct ItemResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub category_ids: Vec<String>,
    pub price_cents: i64,
    pub discount: f64,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        Self {
            id: item.id.to_string(),
            unit_price_cents: item.snapshot().unit_price().cents(),
            category_ids: item.category_ids.iter().map(ToString::to_string).collect(),
            price_cents: item.price.cents(),
            discount: item.discount.percent(),
            quantity: item.quantity,
            name: item.name,
            slug: item.slug,
            description: item.description,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

/// POST /items: create a catalog item.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(payload): Json<NewItem>,
) -> Result<(StatusCode, Json<ItemResponse>), ApiError> {
    let item = state.catalog.create_item(payload).await?;
    Ok((StatusCode::CREATED, Json(item.into())))
}

/// GET /items: list every item.
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    let items = state.catalog.list_items().await?;
    Ok(Json(items.into_iter().map(ItemResponse::from).collect()))
}

/// GET /items/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ItemResponse>, ApiError> {
    let id: ItemId = parse_id(&id, "item")?;
    Ok(Json(state.catalog.get_item(id).await?.into()))
}

/// GET /items/slug/{slug}
#[tracing::instrument(skip(state))]
pub async fn get_by_slug<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(slug): Path<String>,
) -> Result<Json<ItemResponse>, ApiError> {
    Ok(Json(state.catalog.get_item_by_slug(&slug).await?.into()))
}

/// PUT /items/{id}: patch descriptive and pricing fields.
#[tracing::instrument(skip(state, patch))]
pub async fn update<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(patch): Json<ItemPatch>,
) -> Result<Json<ItemResponse>, ApiError> {
    let id: ItemId = parse_id(&id, "item")?;
    Ok(Json(state.catalog.update_item(id, patch).await?.into()))
}

/// DELETE /items/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: ItemId = parse_id(&id, "item")?;
    state.catalog.delete_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
