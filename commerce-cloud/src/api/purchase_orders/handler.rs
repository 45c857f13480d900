//! Purchase order handlers

use axum::extract::State;
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{
    PurchaseOrder, PurchaseOrderCreate, PurchaseOrderDetail, PurchaseOrderStatusUpdate,
};
use shared::response::{PageRequest, PaginatedResponse};

use crate::api::{ApiResult, audit, paged};
use crate::auth::TenantContext;
use crate::db;
use crate::db::purchase_orders::PurchaseOrderFilter;
use crate::extract::{Json, Path, Query};
use crate::state::AppState;
use crate::validation::{
    MAX_LINE_ITEMS, MAX_NOTE_LEN, validate_amount, validate_optional_text, validate_quantity,
};

const RESOURCE: &str = "purchase_order";

fn validate_purchase_order(payload: &PurchaseOrderCreate) -> Result<(), AppError> {
    if payload.items.is_empty() {
        return Err(AppError::new(ErrorCode::PurchaseOrderEmpty));
    }
    if payload.items.len() > MAX_LINE_ITEMS {
        return Err(AppError::validation(format!(
            "too many lines ({}, max {MAX_LINE_ITEMS})",
            payload.items.len()
        ))
        .with_detail("field", "items"));
    }
    for item in &payload.items {
        validate_quantity(item.quantity, "quantity")?;
        if let Some(cost) = item.unit_cost {
            validate_amount(cost, "unit_cost")?;
        }
    }
    validate_optional_text(&payload.notes, "notes", MAX_NOTE_LEN)
}

/// GET /api/purchase-orders - filter by status and supplier
pub async fn list(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(filter): Query<PurchaseOrderFilter>,
    Query(page): Query<PageRequest>,
) -> ApiResult<PaginatedResponse<PurchaseOrder>> {
    let rows = db::purchase_orders::list(&state.pool, ctx.scope, &filter, &page).await?;
    Ok(paged(rows, &page))
}

/// GET /api/purchase-orders/{id} - with lines
pub async fn get_by_id(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<PurchaseOrderDetail> {
    let detail = db::purchase_orders::find_detail(&state.pool, ctx.scope, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::PurchaseOrderNotFound))?;
    Ok(ApiResponse::success(detail))
}

/// POST /api/purchase-orders - new draft
pub async fn create(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(payload): Json<PurchaseOrderCreate>,
) -> ApiResult<PurchaseOrderDetail> {
    let org = ctx.write_org()?;
    validate_purchase_order(&payload)?;

    let now = shared::util::now_millis();
    let detail =
        db::purchase_orders::create(&state.pool, org, &payload, ctx.user.id, now).await?;

    audit(
        &state,
        &ctx.user,
        Some(org),
        "create",
        RESOURCE,
        Some(detail.purchase_order.id),
        Some(serde_json::json!({ "po_number": detail.purchase_order.po_number })),
    )
    .await;
    Ok(ApiResponse::success(detail))
}

/// PUT /api/purchase-orders/{id}/status - order or cancel
pub async fn update_status(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
    Json(payload): Json<PurchaseOrderStatusUpdate>,
) -> ApiResult<PurchaseOrder> {
    let now = shared::util::now_millis();
    let po = db::purchase_orders::change_status(&state.pool, ctx.scope, id, payload.status, now)
        .await?;

    audit(
        &state,
        &ctx.user,
        Some(po.organization_id),
        "change_status",
        RESOURCE,
        Some(po.id),
        Some(serde_json::json!({ "status": payload.status.as_db() })),
    )
    .await;
    Ok(ApiResponse::success(po))
}

/// POST /api/purchase-orders/{id}/receive - book every line into stock
pub async fn receive(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<PurchaseOrderDetail> {
    let now = shared::util::now_millis();
    let detail = db::purchase_orders::receive(&state.pool, ctx.scope, id, ctx.user.id, now).await?;

    audit(
        &state,
        &ctx.user,
        Some(detail.purchase_order.organization_id),
        "receive",
        RESOURCE,
        Some(detail.purchase_order.id),
        Some(serde_json::json!({ "lines": detail.items.len() })),
    )
    .await;
    tracing::info!(
        purchase_order_id = detail.purchase_order.id,
        lines = detail.items.len(),
        "Purchase order received"
    );
    Ok(ApiResponse::success(detail))
}
