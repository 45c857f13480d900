//! Supplier handlers

use axum::extract::State;
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{Supplier, SupplierCreate, SupplierUpdate};
use shared::response::{PageRequest, PaginatedResponse};

use crate::api::{ApiResult, audit, paged};
use crate::auth::TenantContext;
use crate::db;
use crate::db::suppliers::SupplierFilter;
use crate::extract::{Json, Path, Query};
use crate::state::AppState;
use crate::validation::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, normalize_email,
    validate_email, validate_optional_text, validate_required_text,
};

const RESOURCE: &str = "supplier";

/// Normalize and check the optional contact fields in place
fn clean_contact(
    contact_name: &Option<String>,
    email: &mut Option<String>,
    phone: &Option<String>,
    address: &Option<String>,
    notes: &Option<String>,
) -> Result<(), AppError> {
    validate_optional_text(contact_name, "contact_name", MAX_NAME_LEN)?;
    if let Some(value) = email.take() {
        let value = normalize_email(&value);
        validate_email(&value, "email")?;
        *email = Some(value);
    }
    validate_optional_text(phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(address, "address", MAX_ADDRESS_LEN)?;
    validate_optional_text(notes, "notes", MAX_NOTE_LEN)
}

/// GET /api/suppliers
pub async fn list(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(filter): Query<SupplierFilter>,
    Query(page): Query<PageRequest>,
) -> ApiResult<PaginatedResponse<Supplier>> {
    let rows = db::suppliers::list(&state.pool, ctx.scope, &filter, &page).await?;
    Ok(paged(rows, &page))
}

/// GET /api/suppliers/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<Supplier> {
    let supplier = db::suppliers::find_by_id(&state.pool, ctx.scope, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::SupplierNotFound))?;
    Ok(ApiResponse::success(supplier))
}

/// POST /api/suppliers
pub async fn create(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(mut payload): Json<SupplierCreate>,
) -> ApiResult<Supplier> {
    let org = ctx.write_org()?;
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    payload.name = payload.name.trim().to_string();
    clean_contact(
        &payload.contact_name,
        &mut payload.email,
        &payload.phone,
        &payload.address,
        &payload.notes,
    )?;

    let now = shared::util::now_millis();
    let supplier = db::suppliers::create(&state.pool, org, &payload, now).await?;

    audit(&state, &ctx.user, Some(org), "create", RESOURCE, Some(supplier.id), None).await;
    Ok(ApiResponse::success(supplier))
}

/// PUT /api/suppliers/{id}
pub async fn update(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
    Json(mut payload): Json<SupplierUpdate>,
) -> ApiResult<Supplier> {
    if let Some(name) = payload.name.take() {
        validate_required_text(&name, "name", MAX_NAME_LEN)?;
        payload.name = Some(name.trim().to_string());
    }
    clean_contact(
        &payload.contact_name,
        &mut payload.email,
        &payload.phone,
        &payload.address,
        &payload.notes,
    )?;

    let now = shared::util::now_millis();
    let supplier = db::suppliers::update(&state.pool, ctx.scope, id, &payload, now).await?;

    audit(
        &state,
        &ctx.user,
        Some(supplier.organization_id),
        "update",
        RESOURCE,
        Some(supplier.id),
        None,
    )
    .await;
    Ok(ApiResponse::success(supplier))
}

/// DELETE /api/suppliers/{id} - refused while purchase orders reference it
pub async fn delete(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    db::suppliers::delete(&state.pool, ctx.scope, id).await?;
    audit(&state, &ctx.user, ctx.scope.org_id(), "delete", RESOURCE, Some(id), None).await;
    Ok(ApiResponse::ok())
}
