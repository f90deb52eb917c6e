//! HTTP API server for the cart-inventory consistency engine.
//!
//! Provides REST endpoints for carts, the item/category catalog and item reviews,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use document_store::DocumentStore;
use engine::{
    CartService, CatalogService, DualWritePolicy, InventoryActor, ReviewService, StockPolicy,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: DocumentStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route(
            "/cart",
            get(routes::cart::get::<S>).put(routes::cart::update::<S>),
        )
        .route(
            "/items",
            get(routes::items::list::<S>).post(routes::items::create::<S>),
        )
        .route(
            "/items/{id}",
            get(routes::items::get::<S>)
                .put(routes::items::update::<S>)
                .delete(routes::items::delete::<S>),
        )
        .route("/items/slug/{slug}", get(routes::items::get_by_slug::<S>))
        .route(
            "/items/{id}/reviews",
            get(routes::reviews::list_for_item::<S>).post(routes::reviews::post::<S>),
        )
        .route("/reviews/{id}", get(routes::reviews::get::<S>))
        .route(
            "/categories",
            get(routes::categories::list::<S>).post(routes::categories::create::<S>),
        )
        .route(
            "/categories/{id}",
            get(routes::categories::get::<S>)
                .put(routes::categories::update::<S>)
                .delete(routes::categories::delete::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Starts the inventory worker and wires the services around it.
///
/// The worker stops once the returned state, and every router holding it,
/// has been dropped.
pub fn create_default_state<S: DocumentStore + Clone + 'static>(
    store: S,
    stock_policy: StockPolicy,
    dual_write_policy: DualWritePolicy,
) -> (Arc<AppState<S>>, JoinHandle<()>) {
    let (inventory, worker) = InventoryActor::spawn(store.clone(), stock_policy);

    let state = Arc::new(AppState {
        carts: CartService::new(store.clone(), inventory, dual_write_policy),
        catalog: CatalogService::new(store.clone()),
        reviews: ReviewService::new(store),
        stock_policy,
        dual_write_policy,
    });

    (state, worker)
}
