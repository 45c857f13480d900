//! Payment handlers

use axum::extract::State;
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{Payment, PaymentCreate, PaymentReceipt};

use crate::api::{ApiResult, audit};
use crate::auth::TenantContext;
use crate::db;
use crate::extract::{Json, Path};
use crate::state::AppState;
use crate::validation::{MAX_SHORT_TEXT_LEN, validate_optional_text, validate_positive_amount};

const RESOURCE: &str = "payment";

/// GET /api/orders/{id}/payments
pub async fn list_for_order(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(order_id): Path<i64>,
) -> ApiResult<Vec<Payment>> {
    db::orders::find_by_id(&state.pool, ctx.scope, None, order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    let payments = db::payments::list_for_order(&state.pool, ctx.scope, order_id).await?;
    Ok(ApiResponse::success(payments))
}

/// POST /api/orders/{id}/payments - record a payment
///
/// Reaching the order total marks the order paid and credits loyalty
/// points to its customer.
pub async fn create(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(order_id): Path<i64>,
    Json(payload): Json<PaymentCreate>,
) -> ApiResult<PaymentReceipt> {
    validate_positive_amount(payload.amount, "amount")?;
    validate_optional_text(&payload.reference, "reference", MAX_SHORT_TEXT_LEN)?;

    let now = shared::util::now_millis();
    let receipt =
        db::payments::create(&state.pool, ctx.scope, order_id, &payload, ctx.user.id, now).await?;

    audit(
        &state,
        &ctx.user,
        Some(receipt.payment.organization_id),
        "create",
        RESOURCE,
        Some(receipt.payment.id),
        Some(serde_json::json!({
            "order_id": order_id,
            "amount": receipt.payment.amount.to_string(),
            "method": receipt.payment.method,
            "order_status": receipt.order_status,
        })),
    )
    .await;
    Ok(ApiResponse::success(receipt))
}

/// POST /api/payments/{id}/refund
pub async fn refund(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<Payment> {
    let now = shared::util::now_millis();
    let payment = db::payments::refund(&state.pool, ctx.scope, id, ctx.user.id, now).await?;

    audit(
        &state,
        &ctx.user,
        Some(payment.organization_id),
        "refund",
        RESOURCE,
        Some(payment.id),
        Some(serde_json::json!({
            "order_id": payment.order_id,
            "amount": payment.amount.to_string(),
        })),
    )
    .await;
    Ok(ApiResponse::success(payment))
}
