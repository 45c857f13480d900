//! Product and inventory operations

use rust_decimal::Decimal;
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{InventoryMovement, MovementReason, Product, ProductCreate, ProductUpdate};
use shared::response::PageRequest;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::ServiceResult;
use crate::auth::OrgScope;

const COLUMNS: &str = "id, organization_id, sku, name, description, price, cost, stock, \
                       reorder_level, is_active, created_at, updated_at";

const MOVEMENT_COLUMNS: &str =
    "id, organization_id, product_id, delta, reason, reference, created_by, created_at";

#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    /// Matches sku or name
    pub q: Option<String>,
    pub is_active: Option<bool>,
}

fn push_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    scope: OrgScope,
    filter: &ProductFilter,
    active_only: bool,
) {
    scope.push_org_filter(qb, "organization_id");
    if active_only {
        qb.push(" AND is_active");
    } else if let Some(active) = filter.is_active {
        qb.push(" AND is_active = ").push_bind(active);
    }
    if let Some(q) = filter.q.as_deref().filter(|q| !q.trim().is_empty()) {
        let pattern = super::like_pattern(q);
        qb.push(" AND (sku ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// `active_only` hides inactive products (storefront customers)
pub async fn list(
    pool: &PgPool,
    scope: OrgScope,
    filter: &ProductFilter,
    active_only: bool,
    page: &PageRequest,
) -> ServiceResult<(Vec<Product>, i64)> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM products WHERE TRUE");
    push_filters(&mut count, scope, filter, active_only);
    let (total,): (i64,) = count.build_query_as().fetch_one(pool).await?;

    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM products WHERE TRUE"));
    push_filters(&mut qb, scope, filter, active_only);
    qb.push(" ORDER BY name, id LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows = qb.build_query_as().fetch_all(pool).await?;
    Ok((rows, total))
}

pub async fn find_by_id(
    pool: &PgPool,
    scope: OrgScope,
    id: i64,
    active_only: bool,
) -> ServiceResult<Option<Product>> {
    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM products WHERE id = "));
    qb.push_bind(id);
    scope.push_org_filter(&mut qb, "organization_id");
    if active_only {
        qb.push(" AND is_active");
    }
    let row = qb.build_query_as().fetch_optional(pool).await?;
    Ok(row)
}

/// Create a product; opening stock is recorded as an adjustment movement
pub async fn create(
    pool: &PgPool,
    organization_id: i64,
    data: &ProductCreate,
    created_by: i64,
    now: i64,
) -> ServiceResult<Product> {
    let mut tx = pool.begin().await?;
    let stock = data.stock.unwrap_or(0);

    let product: Product = sqlx::query_as(&format!(
        "INSERT INTO products (organization_id, sku, name, description, price, cost, stock,
                               reorder_level, is_active, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE, $9, $9)
         RETURNING {COLUMNS}"
    ))
    .bind(organization_id)
    .bind(&data.sku)
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.price)
    .bind(data.cost.unwrap_or(Decimal::ZERO))
    .bind(stock)
    .bind(data.reorder_level.unwrap_or(0))
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    if stock > 0 {
        record_movement(
            &mut tx,
            organization_id,
            product.id,
            stock,
            MovementReason::Adjustment,
            Some("opening stock"),
            Some(created_by),
            now,
        )
        .await?;
    }

    tx.commit().await?;
    Ok(product)
}

pub async fn update(
    pool: &PgPool,
    scope: OrgScope,
    id: i64,
    data: &ProductUpdate,
    now: i64,
) -> ServiceResult<Product> {
    let mut qb = QueryBuilder::new("UPDATE products SET updated_at = ");
    qb.push_bind(now);
    if let Some(sku) = &data.sku {
        qb.push(", sku = ").push_bind(sku);
    }
    if let Some(name) = &data.name {
        qb.push(", name = ").push_bind(name);
    }
    if let Some(description) = &data.description {
        qb.push(", description = ").push_bind(description);
    }
    if let Some(price) = data.price {
        qb.push(", price = ").push_bind(price);
    }
    if let Some(cost) = data.cost {
        qb.push(", cost = ").push_bind(cost);
    }
    if let Some(reorder_level) = data.reorder_level {
        qb.push(", reorder_level = ").push_bind(reorder_level);
    }
    if let Some(active) = data.is_active {
        qb.push(", is_active = ").push_bind(active);
    }
    qb.push(" WHERE id = ").push_bind(id);
    scope.push_org_filter(&mut qb, "organization_id");
    qb.push(format!(" RETURNING {COLUMNS}"));

    let row = qb.build_query_as().fetch_optional(pool).await?;
    row.ok_or_else(|| AppError::new(ErrorCode::ProductNotFound).into())
}

/// Products already sold or purchased cannot be deleted (foreign key
/// violation, 400); deactivate them instead
pub async fn delete(pool: &PgPool, scope: OrgScope, id: i64) -> ServiceResult<()> {
    let mut qb = QueryBuilder::new("DELETE FROM products WHERE id = ");
    qb.push_bind(id);
    scope.push_org_filter(&mut qb, "organization_id");
    let result = qb.build().execute(pool).await?;
    super::ensure_affected(result.rows_affected(), || AppError::new(ErrorCode::ProductNotFound))
}

#[allow(clippy::too_many_arguments)]
pub async fn record_movement(
    conn: &mut PgConnection,
    organization_id: i64,
    product_id: i64,
    delta: i32,
    reason: MovementReason,
    reference: Option<&str>,
    created_by: Option<i64>,
    now: i64,
) -> ServiceResult<()> {
    sqlx::query(
        "INSERT INTO inventory_movements (organization_id, product_id, delta, reason, reference, created_by, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(organization_id)
    .bind(product_id)
    .bind(delta)
    .bind(reason.as_db())
    .bind(reference)
    .bind(created_by)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Add `delta` to a product's stock, refusing to go below zero
///
/// Returns the new stock level. Unknown products and products of other
/// organizations are not found.
pub async fn apply_stock_delta(
    conn: &mut PgConnection,
    organization_id: i64,
    product_id: i64,
    delta: i32,
    now: i64,
) -> ServiceResult<i32> {
    let row: Option<(i32,)> = sqlx::query_as(
        "UPDATE products SET stock = stock + $3, updated_at = $4
         WHERE id = $1 AND organization_id = $2 AND stock + $3 >= 0
         RETURNING stock",
    )
    .bind(product_id)
    .bind(organization_id)
    .bind(delta)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some((stock,)) = row {
        return Ok(stock);
    }

    // Distinguish "not found" from "not enough stock"
    if super::exists_in_org(conn, "products", product_id, organization_id).await? {
        Err(AppError::new(ErrorCode::StockWouldGoNegative)
            .with_detail("product_id", product_id)
            .with_detail("delta", delta)
            .into())
    } else {
        Err(AppError::new(ErrorCode::ProductNotFound).into())
    }
}

/// Manual stock adjustment with its movement record
pub async fn adjust_stock(
    pool: &PgPool,
    scope: OrgScope,
    product_id: i64,
    delta: i32,
    reference: Option<&str>,
    created_by: i64,
    now: i64,
) -> ServiceResult<Product> {
    let mut tx = pool.begin().await?;

    let org: Option<(i64,)> = {
        let mut qb = QueryBuilder::new("SELECT organization_id FROM products WHERE id = ");
        qb.push_bind(product_id);
        scope.push_org_filter(&mut qb, "organization_id");
        qb.push(" FOR UPDATE");
        qb.build_query_as().fetch_optional(&mut *tx).await?
    };
    let Some((organization_id,)) = org else {
        return Err(AppError::new(ErrorCode::ProductNotFound).into());
    };

    apply_stock_delta(&mut tx, organization_id, product_id, delta, now).await?;
    record_movement(
        &mut tx,
        organization_id,
        product_id,
        delta,
        MovementReason::Adjustment,
        reference,
        Some(created_by),
        now,
    )
    .await?;

    let product = sqlx::query_as(&format!("SELECT {COLUMNS} FROM products WHERE id = $1"))
        .bind(product_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(product)
}

/// Movement history of a product, newest first
pub async fn list_movements(
    pool: &PgPool,
    scope: OrgScope,
    product_id: i64,
    page: &PageRequest,
) -> ServiceResult<(Vec<InventoryMovement>, i64)> {
    let mut count =
        QueryBuilder::new("SELECT COUNT(*) FROM inventory_movements WHERE product_id = ");
    count.push_bind(product_id);
    scope.push_org_filter(&mut count, "organization_id");
    let (total,): (i64,) = count.build_query_as().fetch_one(pool).await?;

    let mut qb = QueryBuilder::new(format!(
        "SELECT {MOVEMENT_COLUMNS} FROM inventory_movements WHERE product_id = "
    ));
    qb.push_bind(product_id);
    scope.push_org_filter(&mut qb, "organization_id");
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows = qb.build_query_as().fetch_all(pool).await?;
    Ok((rows, total))
}

/// Active products at or below their reorder level
pub async fn low_stock(pool: &PgPool, scope: OrgScope) -> ServiceResult<Vec<Product>> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {COLUMNS} FROM products WHERE is_active AND stock <= reorder_level"
    ));
    scope.push_org_filter(&mut qb, "organization_id");
    qb.push(" ORDER BY stock, name");
    let rows = qb.build_query_as().fetch_all(pool).await?;
    Ok(rows)
}
