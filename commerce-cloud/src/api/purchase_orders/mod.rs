//! Purchase order API

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_permission;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/purchase-orders", routes())
}

fn routes() -> Router<AppState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .layer(middleware::from_fn(require_permission("purchase_orders:read")));

    let write_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}/status", put(handler::update_status))
        .layer(middleware::from_fn(require_permission("purchase_orders:write")));

    let receive_routes = Router::new()
        .route("/{id}/receive", post(handler::receive))
        .layer(middleware::from_fn(require_permission("purchase_orders:receive")));

    read_routes.merge(write_routes).merge(receive_routes)
}
