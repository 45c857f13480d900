//! Organization API (platform administration)

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::require_super_admin;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/api/organizations", routes())
        .route("/api/organization", get(handler::current))
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .layer(middleware::from_fn(require_super_admin))
}
