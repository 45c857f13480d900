//! Order handlers
//!
//! A CUSTOMER caller sees only their own orders, and orders they place are
//! always for their own customer record.

use axum::extract::State;
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{Order, OrderCreate, OrderDetail, OrderStatusUpdate};
use shared::response::{PageRequest, PaginatedResponse};

use crate::api::{ApiResult, audit, paged};
use crate::auth::TenantContext;
use crate::db;
use crate::db::orders::{OrderFilter, OrderOwner};
use crate::extract::{Json, Path, Query};
use crate::state::AppState;
use crate::validation::{MAX_LINE_ITEMS, MAX_NOTE_LEN, validate_optional_text, validate_quantity};

const RESOURCE: &str = "order";

fn validate_order(payload: &OrderCreate) -> Result<(), AppError> {
    if payload.items.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty));
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
    }
    validate_optional_text(&payload.notes, "notes", MAX_NOTE_LEN)
}

/// GET /api/orders - filter by status, customer and creation window
pub async fn list(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(filter): Query<OrderFilter>,
    Query(page): Query<PageRequest>,
) -> ApiResult<PaginatedResponse<Order>> {
    let rows =
        db::orders::list(&state.pool, ctx.scope, ctx.customer_scope(), &filter, &page).await?;
    Ok(paged(rows, &page))
}

/// GET /api/orders/{id} - order with lines and amount paid
pub async fn get_by_id(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<OrderDetail> {
    let detail = db::orders::find_detail(&state.pool, ctx.scope, ctx.customer_scope(), id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    Ok(ApiResponse::success(detail))
}

/// POST /api/orders - price lines, reserve stock, compute totals
pub async fn create(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(payload): Json<OrderCreate>,
) -> ApiResult<OrderDetail> {
    let org = ctx.write_org()?;
    validate_order(&payload)?;

    let owner = OrderOwner {
        organization_id: org,
        customer_id: ctx.customer_scope().or(payload.customer_id),
        created_by: ctx.user.id,
    };
    let now = shared::util::now_millis();
    let detail = db::orders::create(&state.pool, &owner, &payload, now).await?;

    audit(
        &state,
        &ctx.user,
        Some(org),
        "create",
        RESOURCE,
        Some(detail.order.id),
        Some(serde_json::json!({
            "order_number": detail.order.order_number,
            "total": detail.order.total.to_string(),
        })),
    )
    .await;
    tracing::info!(
        order_id = detail.order.id,
        order_number = %detail.order.order_number,
        lines = detail.items.len(),
        "Order created"
    );
    Ok(ApiResponse::success(detail))
}

/// PUT /api/orders/{id}/status - cancel or fulfil
///
/// `paid` is only reached by recording payments.
pub async fn update_status(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
    Json(payload): Json<OrderStatusUpdate>,
) -> ApiResult<Order> {
    let now = shared::util::now_millis();
    let order =
        db::orders::change_status(&state.pool, ctx.scope, id, payload.status, ctx.user.id, now)
            .await?;

    audit(
        &state,
        &ctx.user,
        Some(order.organization_id),
        "change_status",
        RESOURCE,
        Some(order.id),
        Some(serde_json::json!({ "status": payload.status.as_db() })),
    )
    .await;
    Ok(ApiResponse::success(order))
}
