//! Loyalty handlers
//!
//! Accounts are addressed by customer id. A CUSTOMER caller only reaches
//! their own account.

use axum::extract::State;
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{LoyaltyAccount, LoyaltyAdjust, LoyaltyTransaction};
use shared::response::{PageRequest, PaginatedResponse};

use crate::api::{ApiResult, audit, paged};
use crate::auth::TenantContext;
use crate::db;
use crate::extract::{Json, Path, Query};
use crate::state::AppState;
use crate::validation::{MAX_SHORT_TEXT_LEN, validate_required_text};

/// Largest single manual adjustment
const MAX_ADJUST_POINTS: i64 = 1_000_000;

async fn find_account(
    state: &AppState,
    ctx: &TenantContext,
    customer_id: i64,
) -> Result<LoyaltyAccount, AppError> {
    let not_found = || AppError::new(ErrorCode::LoyaltyAccountNotFound);
    if ctx.customer_scope().is_some_and(|own| own != customer_id) {
        return Err(not_found());
    }
    db::loyalty::find_by_customer(&state.pool, ctx.scope, customer_id)
        .await?
        .ok_or_else(not_found)
}

/// GET /api/loyalty/accounts - highest balance first
pub async fn list_accounts(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(page): Query<PageRequest>,
) -> ApiResult<PaginatedResponse<LoyaltyAccount>> {
    let rows =
        db::loyalty::list_accounts(&state.pool, ctx.scope, ctx.customer_scope(), &page).await?;
    Ok(paged(rows, &page))
}

/// GET /api/loyalty/accounts/{customer_id}
pub async fn get_account(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(customer_id): Path<i64>,
) -> ApiResult<LoyaltyAccount> {
    Ok(ApiResponse::success(find_account(&state, &ctx, customer_id).await?))
}

/// GET /api/loyalty/accounts/{customer_id}/transactions - newest first
pub async fn list_transactions(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(customer_id): Path<i64>,
    Query(page): Query<PageRequest>,
) -> ApiResult<PaginatedResponse<LoyaltyTransaction>> {
    let account = find_account(&state, &ctx, customer_id).await?;
    let rows = db::loyalty::list_transactions(&state.pool, account.id, &page).await?;
    Ok(paged(rows, &page))
}

/// POST /api/loyalty/accounts/{customer_id}/adjust - signed manual change
///
/// The balance never goes below zero.
pub async fn adjust(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(customer_id): Path<i64>,
    Json(payload): Json<LoyaltyAdjust>,
) -> ApiResult<LoyaltyAccount> {
    let org = ctx.write_org()?;
    if payload.delta == 0 || payload.delta.unsigned_abs() > MAX_ADJUST_POINTS.unsigned_abs() {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("delta must be non-zero and at most {MAX_ADJUST_POINTS} in size"),
        )
        .with_detail("field", "delta")
        .into());
    }
    validate_required_text(&payload.reason, "reason", MAX_SHORT_TEXT_LEN)?;

    let now = shared::util::now_millis();
    let account = db::loyalty::adjust(
        &state.pool,
        org,
        customer_id,
        payload.delta,
        payload.reason.trim(),
        ctx.user.id,
        now,
    )
    .await?;

    audit(
        &state,
        &ctx.user,
        Some(org),
        "adjust",
        "loyalty_account",
        Some(account.id),
        Some(serde_json::json!({
            "customer_id": customer_id,
            "delta": payload.delta,
            "balance": account.points_balance,
        })),
    )
    .await;
    Ok(ApiResponse::success(account))
}
