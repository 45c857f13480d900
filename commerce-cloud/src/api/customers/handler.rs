//! Customer handlers

use axum::extract::State;
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{Customer, CustomerCreate, CustomerUpdate};
use shared::response::{PageRequest, PaginatedResponse};

use crate::api::{ApiResult, audit, paged};
use crate::auth::TenantContext;
use crate::db;
use crate::db::customers::CustomerFilter;
use crate::extract::{Json, Path, Query};
use crate::state::AppState;
use crate::validation::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, normalize_email,
    validate_email, validate_optional_text, validate_required_text,
};

const RESOURCE: &str = "customer";

fn validate_contact(
    phone: &Option<String>,
    address: &Option<String>,
    notes: &Option<String>,
) -> Result<(), AppError> {
    validate_optional_text(phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(address, "address", MAX_ADDRESS_LEN)?;
    validate_optional_text(notes, "notes", MAX_NOTE_LEN)
}

/// GET /api/customers - search by name, email or phone with `q`
pub async fn list(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(filter): Query<CustomerFilter>,
    Query(page): Query<PageRequest>,
) -> ApiResult<PaginatedResponse<Customer>> {
    let rows = db::customers::list(&state.pool, ctx.scope, &filter, &page).await?;
    Ok(paged(rows, &page))
}

/// GET /api/customers/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<Customer> {
    let customer = db::customers::find_by_id(&state.pool, ctx.scope, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CustomerNotFound))?;
    Ok(ApiResponse::success(customer))
}

/// POST /api/customers
pub async fn create(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(mut payload): Json<CustomerCreate>,
) -> ApiResult<Customer> {
    let org = ctx.write_org()?;
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    payload.name = payload.name.trim().to_string();
    payload.email = normalize_email(&payload.email);
    validate_email(&payload.email, "email")?;
    validate_contact(&payload.phone, &payload.address, &payload.notes)?;

    let now = shared::util::now_millis();
    let customer = db::customers::create(&state.pool, org, &payload, now).await?;

    audit(&state, &ctx.user, Some(org), "create", RESOURCE, Some(customer.id), None).await;
    Ok(ApiResponse::success(customer))
}

/// PUT /api/customers/{id}
pub async fn update(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
    Json(mut payload): Json<CustomerUpdate>,
) -> ApiResult<Customer> {
    if let Some(name) = payload.name.take() {
        validate_required_text(&name, "name", MAX_NAME_LEN)?;
        payload.name = Some(name.trim().to_string());
    }
    if let Some(email) = payload.email.take() {
        let email = normalize_email(&email);
        validate_email(&email, "email")?;
        payload.email = Some(email);
    }
    validate_contact(&payload.phone, &payload.address, &payload.notes)?;

    let now = shared::util::now_millis();
    let customer = db::customers::update(&state.pool, ctx.scope, id, &payload, now).await?;

    audit(
        &state,
        &ctx.user,
        Some(customer.organization_id),
        "update",
        RESOURCE,
        Some(customer.id),
        None,
    )
    .await;
    Ok(ApiResponse::success(customer))
}

/// DELETE /api/customers/{id}
pub async fn delete(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    db::customers::delete(&state.pool, ctx.scope, id).await?;
    audit(&state, &ctx.user, ctx.scope.org_id(), "delete", RESOURCE, Some(id), None).await;
    Ok(ApiResponse::ok())
}
