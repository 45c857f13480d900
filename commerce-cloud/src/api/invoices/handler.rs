//! Invoice handlers

use axum::extract::State;
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{Invoice, InvoiceCreate, InvoiceStatusUpdate};
use shared::response::{PageRequest, PaginatedResponse};

use crate::api::{ApiResult, audit, paged};
use crate::auth::TenantContext;
use crate::db;
use crate::db::invoices::InvoiceFilter;
use crate::extract::{Json, Path, Query};
use crate::state::AppState;
use crate::validation::{MAX_NOTE_LEN, validate_optional_text, validate_positive_amount};

const RESOURCE: &str = "invoice";

/// GET /api/invoices - filter by status, customer or order
pub async fn list(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(filter): Query<InvoiceFilter>,
    Query(page): Query<PageRequest>,
) -> ApiResult<PaginatedResponse<Invoice>> {
    let rows = db::invoices::list(&state.pool, ctx.scope, &filter, &page).await?;
    Ok(paged(rows, &page))
}

/// GET /api/invoices/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<Invoice> {
    let invoice = db::invoices::find_by_id(&state.pool, ctx.scope, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::InvoiceNotFound))?;
    Ok(ApiResponse::success(invoice))
}

/// POST /api/invoices - draft invoice, for an order or a free amount
pub async fn create(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(payload): Json<InvoiceCreate>,
) -> ApiResult<Invoice> {
    let org = ctx.write_org()?;
    if let Some(amount) = payload.amount {
        validate_positive_amount(amount, "amount")?;
    }
    validate_optional_text(&payload.notes, "notes", MAX_NOTE_LEN)?;

    let now = shared::util::now_millis();
    let invoice = db::invoices::create(&state.pool, org, &payload, now).await?;

    audit(
        &state,
        &ctx.user,
        Some(org),
        "create",
        RESOURCE,
        Some(invoice.id),
        Some(serde_json::json!({
            "invoice_number": invoice.invoice_number,
            "amount": invoice.amount.to_string(),
        })),
    )
    .await;
    Ok(ApiResponse::success(invoice))
}

/// PUT /api/invoices/{id}/status - issue, mark paid or void
pub async fn update_status(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
    Json(payload): Json<InvoiceStatusUpdate>,
) -> ApiResult<Invoice> {
    let now = shared::util::now_millis();
    let invoice =
        db::invoices::change_status(&state.pool, ctx.scope, id, payload.status, now).await?;

    audit(
        &state,
        &ctx.user,
        Some(invoice.organization_id),
        "change_status",
        RESOURCE,
        Some(invoice.id),
        Some(serde_json::json!({ "status": payload.status.as_db() })),
    )
    .await;
    Ok(ApiResponse::success(invoice))
}
