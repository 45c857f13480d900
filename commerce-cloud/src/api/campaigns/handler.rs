//! Campaign handlers

use axum::extract::State;
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{Campaign, CampaignCreate, CampaignUpdate, is_valid_schedule};
use shared::response::{PageRequest, PaginatedResponse};

use crate::api::{ApiResult, audit, paged};
use crate::auth::TenantContext;
use crate::db;
use crate::db::campaigns::CampaignFilter;
use crate::extract::{Json, Path, Query};
use crate::state::AppState;
use crate::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, validate_amount, validate_optional_text, validate_required_text,
};

const RESOURCE: &str = "campaign";

/// GET /api/campaigns - filter by status and channel
pub async fn list(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(filter): Query<CampaignFilter>,
    Query(page): Query<PageRequest>,
) -> ApiResult<PaginatedResponse<Campaign>> {
    let rows = db::campaigns::list(&state.pool, ctx.scope, &filter, &page).await?;
    Ok(paged(rows, &page))
}

/// GET /api/campaigns/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<Campaign> {
    let campaign = db::campaigns::find_by_id(&state.pool, ctx.scope, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CampaignNotFound))?;
    Ok(ApiResponse::success(campaign))
}

/// POST /api/campaigns - new draft
pub async fn create(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(mut payload): Json<CampaignCreate>,
) -> ApiResult<Campaign> {
    let org = ctx.write_org()?;
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    payload.name = payload.name.trim().to_string();
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    if let Some(budget) = payload.budget {
        validate_amount(budget, "budget")?;
    }
    if !is_valid_schedule(payload.starts_at, payload.ends_at) {
        return Err(AppError::new(ErrorCode::CampaignInvalidSchedule).into());
    }

    let now = shared::util::now_millis();
    let campaign = db::campaigns::create(&state.pool, org, &payload, now).await?;

    audit(&state, &ctx.user, Some(org), "create", RESOURCE, Some(campaign.id), None).await;
    Ok(ApiResponse::success(campaign))
}

/// PUT /api/campaigns/{id} - edit or move through the workflow
pub async fn update(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
    Json(mut payload): Json<CampaignUpdate>,
) -> ApiResult<Campaign> {
    if let Some(name) = payload.name.take() {
        validate_required_text(&name, "name", MAX_NAME_LEN)?;
        payload.name = Some(name.trim().to_string());
    }
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    if let Some(budget) = payload.budget {
        validate_amount(budget, "budget")?;
    }

    let now = shared::util::now_millis();
    let campaign = db::campaigns::update(&state.pool, ctx.scope, id, &payload, now).await?;

    audit(
        &state,
        &ctx.user,
        Some(campaign.organization_id),
        "update",
        RESOURCE,
        Some(campaign.id),
        payload
            .status
            .map(|s| serde_json::json!({ "status": s.as_db() })),
    )
    .await;
    Ok(ApiResponse::success(campaign))
}

/// DELETE /api/campaigns/{id}
pub async fn delete(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    db::campaigns::delete(&state.pool, ctx.scope, id).await?;
    audit(&state, &ctx.user, ctx.scope.org_id(), "delete", RESOURCE, Some(id), None).await;
    Ok(ApiResponse::ok())
}
