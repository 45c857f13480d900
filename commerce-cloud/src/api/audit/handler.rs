//! Audit log handlers

use axum::extract::State;
use shared::models::AuditEntry;
use shared::response::{PageRequest, PaginatedResponse};

use crate::api::{ApiResult, paged};
use crate::auth::TenantContext;
use crate::db;
use crate::db::audit::AuditFilter;
use crate::extract::Query;
use crate::state::AppState;

/// GET /api/audit - newest first, filter by action, resource and user
///
/// A platform administrator without an organization selected also sees
/// platform-level entries.
pub async fn list(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(filter): Query<AuditFilter>,
    Query(page): Query<PageRequest>,
) -> ApiResult<PaginatedResponse<AuditEntry>> {
    let rows = db::audit::query(&state.pool, ctx.scope, &filter, &page).await?;
    Ok(paged(rows, &page))
}
