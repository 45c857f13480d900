//! Invoice API

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_permission;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/invoices", routes())
}

fn routes() -> Router<AppState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .layer(middleware::from_fn(require_permission("invoices:read")));

    let write_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}/status", put(handler::update_status))
        .layer(middleware::from_fn(require_permission("invoices:write")));

    read_routes.merge(write_routes)
}
