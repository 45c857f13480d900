//! Support ticket API

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_permission;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/tickets", routes())
}

fn routes() -> Router<AppState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/comments", get(handler::list_comments))
        .layer(middleware::from_fn(require_permission("tickets:read")));

    let write_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update))
        .route("/{id}/comments", post(handler::add_comment))
        .layer(middleware::from_fn(require_permission("tickets:write")));

    read_routes.merge(write_routes)
}
