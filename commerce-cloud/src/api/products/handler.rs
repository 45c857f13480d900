//! Product handlers
//!
//! Storefront customers only ever see active products.

use axum::extract::State;
use rust_decimal::Decimal;
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{Product, ProductCreate, ProductUpdate};
use shared::response::{PageRequest, PaginatedResponse};

use crate::api::{ApiResult, audit, paged};
use crate::auth::TenantContext;
use crate::db;
use crate::db::products::ProductFilter;
use crate::extract::{Json, Path, Query};
use crate::state::AppState;
use crate::validation::{
    MAX_AMOUNT, MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_amount,
    validate_non_negative, validate_optional_text, validate_required_text,
};

const RESOURCE: &str = "product";

fn validate_price(price: Decimal) -> Result<(), AppError> {
    if price.is_sign_negative() || price > MAX_AMOUNT {
        return Err(AppError::with_message(
            ErrorCode::ProductInvalidPrice,
            format!("price must be between 0 and {MAX_AMOUNT}"),
        )
        .with_detail("field", "price"));
    }
    Ok(())
}

/// GET /api/products - search by sku or name with `q`
pub async fn list(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(filter): Query<ProductFilter>,
    Query(page): Query<PageRequest>,
) -> ApiResult<PaginatedResponse<Product>> {
    let rows =
        db::products::list(&state.pool, ctx.scope, &filter, ctx.is_customer(), &page).await?;
    Ok(paged(rows, &page))
}

/// GET /api/products/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<Product> {
    let product = db::products::find_by_id(&state.pool, ctx.scope, id, ctx.is_customer())
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))?;
    Ok(ApiResponse::success(product))
}

/// POST /api/products - opening stock is recorded as a movement
pub async fn create(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(mut payload): Json<ProductCreate>,
) -> ApiResult<Product> {
    let org = ctx.write_org()?;
    validate_required_text(&payload.sku, "sku", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_price(payload.price)?;
    if let Some(cost) = payload.cost {
        validate_amount(cost, "cost")?;
    }
    validate_non_negative(payload.stock.unwrap_or(0), "stock")?;
    validate_non_negative(payload.reorder_level.unwrap_or(0), "reorder_level")?;
    payload.sku = payload.sku.trim().to_string();
    payload.name = payload.name.trim().to_string();

    let now = shared::util::now_millis();
    let product = db::products::create(&state.pool, org, &payload, ctx.user.id, now).await?;

    audit(
        &state,
        &ctx.user,
        Some(org),
        "create",
        RESOURCE,
        Some(product.id),
        Some(serde_json::json!({ "sku": product.sku })),
    )
    .await;
    Ok(ApiResponse::success(product))
}

/// PUT /api/products/{id} - catalog fields; stock moves through adjustments
pub async fn update(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
    Json(mut payload): Json<ProductUpdate>,
) -> ApiResult<Product> {
    if let Some(sku) = payload.sku.take() {
        validate_required_text(&sku, "sku", MAX_SHORT_TEXT_LEN)?;
        payload.sku = Some(sku.trim().to_string());
    }
    if let Some(name) = payload.name.take() {
        validate_required_text(&name, "name", MAX_NAME_LEN)?;
        payload.name = Some(name.trim().to_string());
    }
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    if let Some(price) = payload.price {
        validate_price(price)?;
    }
    if let Some(cost) = payload.cost {
        validate_amount(cost, "cost")?;
    }
    if let Some(level) = payload.reorder_level {
        validate_non_negative(level, "reorder_level")?;
    }

    let now = shared::util::now_millis();
    let product = db::products::update(&state.pool, ctx.scope, id, &payload, now).await?;

    audit(
        &state,
        &ctx.user,
        Some(product.organization_id),
        "update",
        RESOURCE,
        Some(product.id),
        None,
    )
    .await;
    Ok(ApiResponse::success(product))
}

/// DELETE /api/products/{id}
///
/// Products referenced by orders or purchase orders cannot be deleted;
/// deactivate them instead.
pub async fn delete(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    db::products::delete(&state.pool, ctx.scope, id).await?;
    audit(&state, &ctx.user, ctx.scope.org_id(), "delete", RESOURCE, Some(id), None).await;
    Ok(ApiResponse::ok())
}
