//! Support ticket handlers
//!
//! Customers open tickets for themselves, see only their own, and cannot
//! assign or re-prioritize them.

use axum::extract::State;
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{
    SupportTicket, TicketComment, TicketCommentCreate, TicketCreate, TicketUpdate,
};
use shared::response::{PageRequest, PaginatedResponse};

use crate::api::{ApiResult, audit, paged};
use crate::auth::TenantContext;
use crate::db;
use crate::db::tickets::TicketFilter;
use crate::extract::{Json, Path, Query};
use crate::security_log;
use crate::state::AppState;
use crate::validation::{MAX_NAME_LEN, MAX_NOTE_LEN, validate_required_text};

const RESOURCE: &str = "ticket";

fn staff_only(ctx: &TenantContext, field: &'static str) -> AppError {
    security_log!(
        "WARN",
        "customer_ticket_field_denied",
        user_id = ctx.user.id,
        field = field
    );
    AppError::permission_denied(format!("Customers cannot set {field}")).with_detail("field", field)
}

async fn find_ticket(state: &AppState, ctx: &TenantContext, id: i64) -> Result<SupportTicket, AppError> {
    db::tickets::find_by_id(&state.pool, ctx.scope, ctx.customer_scope(), id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::TicketNotFound))
}

/// GET /api/tickets - filter by status, priority, assignee and customer
pub async fn list(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(filter): Query<TicketFilter>,
    Query(page): Query<PageRequest>,
) -> ApiResult<PaginatedResponse<SupportTicket>> {
    let rows =
        db::tickets::list(&state.pool, ctx.scope, ctx.customer_scope(), &filter, &page).await?;
    Ok(paged(rows, &page))
}

/// GET /api/tickets/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<SupportTicket> {
    Ok(ApiResponse::success(find_ticket(&state, &ctx, id).await?))
}

/// POST /api/tickets - open a ticket
pub async fn create(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(mut payload): Json<TicketCreate>,
) -> ApiResult<SupportTicket> {
    let org = ctx.write_org()?;
    validate_required_text(&payload.subject, "subject", MAX_NAME_LEN)?;
    validate_required_text(&payload.description, "description", MAX_NOTE_LEN)?;

    if let Some(customer_id) = ctx.customer_scope() {
        if payload.assignee_id.is_some() {
            return Err(staff_only(&ctx, "assignee_id").into());
        }
        payload.customer_id = Some(customer_id);
    }

    let now = shared::util::now_millis();
    let ticket = db::tickets::create(&state.pool, org, &payload, ctx.user.id, now).await?;

    audit(&state, &ctx.user, Some(org), "create", RESOURCE, Some(ticket.id), None).await;
    Ok(ApiResponse::success(ticket))
}

/// PUT /api/tickets/{id} - edit, assign, or move through the workflow
pub async fn update(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
    Json(payload): Json<TicketUpdate>,
) -> ApiResult<SupportTicket> {
    if ctx.is_customer() {
        if payload.assignee_id.is_some() {
            return Err(staff_only(&ctx, "assignee_id").into());
        }
        if payload.priority.is_some() {
            return Err(staff_only(&ctx, "priority").into());
        }
    }
    if let Some(subject) = &payload.subject {
        validate_required_text(subject, "subject", MAX_NAME_LEN)?;
    }
    if let Some(description) = &payload.description {
        validate_required_text(description, "description", MAX_NOTE_LEN)?;
    }

    let now = shared::util::now_millis();
    let ticket =
        db::tickets::update(&state.pool, ctx.scope, ctx.customer_scope(), id, &payload, now)
            .await?;

    audit(
        &state,
        &ctx.user,
        Some(ticket.organization_id),
        "update",
        RESOURCE,
        Some(ticket.id),
        Some(serde_json::json!({
            "status": payload.status.map(|s| s.as_db()),
            "assignee_id": payload.assignee_id,
        })),
    )
    .await;
    Ok(ApiResponse::success(ticket))
}

/// GET /api/tickets/{id}/comments - oldest first
pub async fn list_comments(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<Vec<TicketComment>> {
    let ticket = find_ticket(&state, &ctx, id).await?;
    let comments = db::tickets::list_comments(&state.pool, ticket.id).await?;
    Ok(ApiResponse::success(comments))
}

/// POST /api/tickets/{id}/comments
pub async fn add_comment(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
    Json(payload): Json<TicketCommentCreate>,
) -> ApiResult<TicketComment> {
    validate_required_text(&payload.body, "body", MAX_NOTE_LEN)?;
    let ticket = find_ticket(&state, &ctx, id).await?;

    let now = shared::util::now_millis();
    let comment =
        db::tickets::add_comment(&state.pool, &ticket, ctx.user.id, payload.body.trim(), now)
            .await?;
    Ok(ApiResponse::success(comment))
}
