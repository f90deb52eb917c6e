//! Cart endpoints. The caller is identified by the `x-user-id` header.

use std::sync::Arc;

use axum::Json;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use chrono::{DateTime, Utc};
use document_store::DocumentStore;
use domain::{Cart, ItemId, LineItem, UserId};
use serde::{Deserialize, Serialize};

use super::{AppState, parse_id};
use crate::error::ApiError;

pub const USER_HEADER: &str = "x-user-id";

/// The shopper making the request.
pub struct CurrentUser(pub UserId);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_HEADER)
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {USER_HEADER} header")))?
            .to_str()
            .map_err(|_| ApiError::BadRequest(format!("{USER_HEADER} is not valid text")))?;
        Ok(CurrentUser(parse_id(raw, "user")?))
    }
}

// -- Request types --

/// Body of `PUT /cart`: positive quantities add, negative ones remove.
#[derive(Deserialize)]
pub struct UpdateCartRequest {
    pub item_id: ItemId,
    pub quantity: i64,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartResponse {
    pub id: String,
    pub user_id: String,
    pub line_items: Vec<LineItemResponse>,
    pub total_price_cents: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct LineItemResponse {
    pub item_id: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
}

impl From<&LineItem> for LineItemResponse {
    fn from(line: &LineItem) -> Self {
        Self {
            item_id: line.item_id.to_string(),
            quantity: line.quantity,
            unit_price_cents: line.unit_price.cents(),
            total_price_cents: line.total_price.cents(),
        }
    }
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        Self {
            id: cart.id().to_string(),
            user_id: cart.user_id().to_string(),
            line_items: cart.line_items().iter().map(LineItemResponse::from).collect(),
            total_price_cents: cart.total_price().cents(),
            updated_at: cart.updated_at(),
        }
    }
}

// -- Handlers --

/// GET /cart: the caller's cart.
#[tracing::instrument(skip(state, user), fields(user_id = %user.0))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: CurrentUser,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state
        .carts
        .get_cart(user.0)
        .await?
        .ok_or_else(|| ApiError::NotFound("cart not found".to_string()))?;
    Ok(Json(CartResponse::from(&cart)))
}

/// PUT /cart: add items to or remove items from the caller's cart.
#[tracing::instrument(skip(state, user, req), fields(user_id = %user.0, item_id = %req.item_id, quantity = req.quantity))]
pub async fn update<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: CurrentUser,
    Json(req): Json<UpdateCartRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let amount = u32::try_from(req.quantity.unsigned_abs())
        .map_err(|_| ApiError::BadRequest(format!("quantity {} is out of range", req.quantity)))?;

    let cart = match req.quantity {
        0 => return Err(ApiError::BadRequest("invalid quantity: 0".to_string())),
        q if q > 0 => state.carts.add_to_cart(user.0, req.item_id, amount).await?,
        _ => {
            state
                .carts
                .remove_from_cart(user.0, req.item_id, amount)
                .await?
        }
    };
    Ok(Json(CartResponse::from(&cart)))
}
