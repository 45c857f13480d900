//! Organization handlers

use axum::extract::State;
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{Organization, OrganizationCreate, OrganizationUpdate, is_valid_slug};
use shared::response::{PageRequest, PaginatedResponse};

use crate::api::{ApiResult, audit, paged};
use crate::auth::{CurrentUser, TenantContext};
use crate::db;
use crate::extract::{Json, Path, Query};
use crate::state::AppState;
use crate::validation::{MAX_NAME_LEN, validate_required_text};

const RESOURCE: &str = "organization";

fn validate_slug(slug: &str) -> Result<(), AppError> {
    if !is_valid_slug(slug) {
        return Err(AppError::with_message(
            ErrorCode::InvalidFormat,
            "slug must be 2-64 lowercase letters, digits or inner hyphens",
        )
        .with_detail("field", "slug"));
    }
    Ok(())
}

/// GET /api/organizations - every organization
pub async fn list(
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> ApiResult<PaginatedResponse<Organization>> {
    let rows = db::organizations::list(&state.pool, &page).await?;
    Ok(paged(rows, &page))
}

/// GET /api/organizations/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Organization> {
    let org = db::organizations::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::TenantNotFound))?;
    Ok(ApiResponse::success(org))
}

/// POST /api/organizations
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(mut payload): Json<OrganizationCreate>,
) -> ApiResult<Organization> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    payload.slug = payload.slug.trim().to_lowercase();
    validate_slug(&payload.slug)?;

    let now = shared::util::now_millis();
    let org = db::organizations::create(&state.pool, &payload, now).await?;

    audit(&state, &user, Some(org.id), "create", RESOURCE, Some(org.id), None).await;
    tracing::info!(organization_id = org.id, slug = %org.slug, "Organization created");
    Ok(ApiResponse::success(org))
}

/// PUT /api/organizations/{id} - rename, change slug, suspend or reactivate
pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(mut payload): Json<OrganizationUpdate>,
) -> ApiResult<Organization> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(slug) = payload.slug.take() {
        let slug = slug.trim().to_lowercase();
        validate_slug(&slug)?;
        payload.slug = Some(slug);
    }

    let now = shared::util::now_millis();
    let org = db::organizations::update(&state.pool, id, &payload, now).await?;

    let detail = payload
        .status
        .map(|s| serde_json::json!({ "status": s.as_db() }));
    audit(&state, &user, Some(org.id), "update", RESOURCE, Some(org.id), detail).await;
    Ok(ApiResponse::success(org))
}

/// DELETE /api/organizations/{id} - only organizations without data
pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    db::organizations::delete(&state.pool, id).await?;
    // The row is gone, so the entry is platform-level
    audit(&state, &user, None, "delete", RESOURCE, Some(id), None).await;
    Ok(ApiResponse::ok())
}

/// GET /api/organization - the caller's own organization
///
/// A platform administrator names it with the `x-organization-id` header.
pub async fn current(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> ApiResult<Organization> {
    let id = ctx.write_org()?;
    let org = db::organizations::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::TenantNotFound))?;
    Ok(ApiResponse::success(org))
}
