//! Audit log API (read-only)

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::require_permission;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/audit", get(handler::list))
        .layer(middleware::from_fn(require_permission("audit:read")))
}
