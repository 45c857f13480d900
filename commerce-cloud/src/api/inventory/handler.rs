//! Inventory handlers

use axum::extract::State;
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{InventoryMovement, Product, StockAdjustment};
use shared::response::{PageRequest, PaginatedResponse};

use crate::api::{ApiResult, audit, paged};
use crate::auth::TenantContext;
use crate::db;
use crate::extract::{Json, Path, Query};
use crate::state::AppState;
use crate::validation::{MAX_QUANTITY, MAX_SHORT_TEXT_LEN, validate_optional_text};

/// POST /api/products/{id}/stock - signed manual adjustment
///
/// Stock never goes below zero.
pub async fn adjust(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
    Json(payload): Json<StockAdjustment>,
) -> ApiResult<Product> {
    if payload.delta == 0 || payload.delta.unsigned_abs() > MAX_QUANTITY.unsigned_abs() {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("delta must be non-zero and at most {MAX_QUANTITY} in size"),
        )
        .with_detail("field", "delta")
        .into());
    }
    validate_optional_text(&payload.reference, "reference", MAX_SHORT_TEXT_LEN)?;

    let now = shared::util::now_millis();
    let product = db::products::adjust_stock(
        &state.pool,
        ctx.scope,
        id,
        payload.delta,
        payload.reference.as_deref(),
        ctx.user.id,
        now,
    )
    .await?;

    audit(
        &state,
        &ctx.user,
        Some(product.organization_id),
        "adjust_stock",
        "product",
        Some(product.id),
        Some(serde_json::json!({ "delta": payload.delta, "stock": product.stock })),
    )
    .await;
    Ok(ApiResponse::success(product))
}

/// GET /api/products/{id}/movements - stock ledger, newest first
pub async fn movements(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
    Query(page): Query<PageRequest>,
) -> ApiResult<PaginatedResponse<InventoryMovement>> {
    db::products::find_by_id(&state.pool, ctx.scope, id, false)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))?;
    let rows = db::products::list_movements(&state.pool, ctx.scope, id, &page).await?;
    Ok(paged(rows, &page))
}

/// GET /api/inventory/low-stock - active products at or below reorder level
pub async fn low_stock(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> ApiResult<Vec<Product>> {
    let products = db::products::low_stock(&state.pool, ctx.scope).await?;
    Ok(ApiResponse::success(products))
}
