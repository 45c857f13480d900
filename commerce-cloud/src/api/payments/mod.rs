//! Payment API

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_permission;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    let read_routes = Router::new()
        .route("/api/orders/{id}/payments", get(handler::list_for_order))
        .layer(middleware::from_fn(require_permission("payments:read")));

    let write_routes = Router::new()
        .route("/api/orders/{id}/payments", post(handler::create))
        .layer(middleware::from_fn(require_permission("payments:write")));

    let refund_routes = Router::new()
        .route("/api/payments/{id}/refund", post(handler::refund))
        .layer(middleware::from_fn(require_permission("payments:refund")));

    read_routes.merge(write_routes).merge(refund_routes)
}
