//! Loyalty API

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_permission;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/loyalty/accounts", routes())
}

fn routes() -> Router<AppState> {
    let read_routes = Router::new()
        .route("/", get(handler::list_accounts))
        .route("/{customer_id}", get(handler::get_account))
        .route("/{customer_id}/transactions", get(handler::list_transactions))
        .layer(middleware::from_fn(require_permission("loyalty:read")));

    let adjust_routes = Router::new()
        .route("/{customer_id}/adjust", post(handler::adjust))
        .layer(middleware::from_fn(require_permission("loyalty:adjust")));

    read_routes.merge(adjust_routes)
}
