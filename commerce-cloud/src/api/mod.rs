//! HTTP API for commerce-cloud
//!
//! One module per resource, each exposing a `router()` in the same shape:
//! read routes and write routes merged, every group behind its
//! `require_permission` layer. [`build_app`] assembles them under the
//! global middleware stack.

pub mod audit;
pub mod auth;
pub mod campaigns;
pub mod customers;
pub mod health;
pub mod inventory;
pub mod invoices;
pub mod loyalty;
pub mod orders;
pub mod organizations;
pub mod payments;
pub mod products;
pub mod purchase_orders;
pub mod suppliers;
pub mod tickets;
pub mod users;

use axum::{Router, middleware};
use serde_json::Value;
use shared::error::{ApiResponse, AppError};
use shared::response::{PageRequest, PaginatedResponse};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::ServiceError;
use crate::auth::{CurrentUser, require_auth};
use crate::correlation::{REQUEST_ID_HEADER, XRequestId, correlate};
use crate::db;
use crate::state::AppState;

/// Handler result: data envelope, or an error envelope via [`ServiceError`]
pub type ApiResult<T> = Result<ApiResponse<T>, ServiceError>;

/// Wrap a `(rows, total)` pair from the db layer into a page envelope
pub(crate) fn paged<T>((items, total): (Vec<T>, i64), page: &PageRequest) -> ApiResponse<PaginatedResponse<T>> {
    ApiResponse::success(PaginatedResponse::new(items, page, total))
}

/// Record a mutation in the audit trail
///
/// Best effort: a failed insert is logged and never fails the request.
pub(crate) async fn audit(
    state: &AppState,
    user: &CurrentUser,
    organization_id: Option<i64>,
    action: &str,
    resource: &str,
    resource_id: Option<i64>,
    detail: Option<Value>,
) {
    let entry = db::audit::NewAuditEntry {
        organization_id,
        user_id: Some(user.id),
        action,
        resource,
        resource_id,
        detail,
        correlation: shared::correlation::current(),
    };
    if let Err(e) = db::audit::log(&state.pool, &entry, shared::util::now_millis()).await {
        tracing::warn!(error = ?e, action, resource, "Failed to write audit entry");
    }
}

/// Every route of the API, without global middleware
pub fn build_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router(state))
        .merge(organizations::router())
        .merge(users::router())
        .merge(customers::router())
        .merge(products::router())
        .merge(inventory::router())
        .merge(orders::router())
        .merge(payments::router())
        .merge(suppliers::router())
        .merge(purchase_orders::router())
        .merge(invoices::router())
        .merge(tickets::router())
        .merge(campaigns::router())
        .merge(loyalty::router())
        .merge(audit::router())
        .fallback(fallback)
}

/// The complete application
///
/// Layers, outermost first:
/// 1. `SetRequestIdLayer` - ensure `x-request-id` (UUID v4 when absent)
/// 2. `PropagateRequestIdLayer` - copy it onto the response
/// 3. `TraceLayer` - HTTP spans
/// 4. `CompressionLayer` - gzip
/// 5. `CorsLayer` - permissive CORS, answers preflight
/// 6. `correlate` - bind the correlation id, request log
/// 7. `require_auth` - session resolution for every non-public path
pub fn build_app(state: AppState) -> Router {
    build_router(&state)
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(middleware::from_fn(correlate))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
        .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, XRequestId))
}

/// Unknown route: 404 envelope
async fn fallback(uri: http::Uri) -> AppError {
    AppError::not_found(format!("Route {}", uri.path()))
}
