//! Inventory API: stock adjustments, movement history, low-stock report

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_permission;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    let read_routes = Router::new()
        .route("/api/products/{id}/movements", get(handler::movements))
        .route("/api/inventory/low-stock", get(handler::low_stock))
        .layer(middleware::from_fn(require_permission("inventory:read")));

    let adjust_routes = Router::new()
        .route("/api/products/{id}/stock", post(handler::adjust))
        .layer(middleware::from_fn(require_permission("inventory:adjust")));

    read_routes.merge(adjust_routes)
}
