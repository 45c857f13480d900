//! Organization (tenant) operations

use shared::error::{AppError, ErrorCode};
use shared::models::{Organization, OrganizationCreate, OrganizationStatus, OrganizationUpdate};
use shared::response::PageRequest;
use sqlx::PgPool;

use crate::ServiceResult;

const COLUMNS: &str = "id, name, slug, status, created_at, updated_at";

pub async fn list(pool: &PgPool, page: &PageRequest) -> ServiceResult<(Vec<Organization>, i64)> {
    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM organizations")
        .fetch_one(pool)
        .await?;
    let rows = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM organizations ORDER BY id LIMIT $1 OFFSET $2"
    ))
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await?;
    Ok((rows, total))
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> ServiceResult<Option<Organization>> {
    let row = sqlx::query_as(&format!("SELECT {COLUMNS} FROM organizations WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(pool: &PgPool, data: &OrganizationCreate, now: i64) -> ServiceResult<Organization> {
    let row = sqlx::query_as(&format!(
        "INSERT INTO organizations (name, slug, status, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $4)
         RETURNING {COLUMNS}"
    ))
    .bind(data.name.trim())
    .bind(&data.slug)
    .bind(OrganizationStatus::Active.as_db())
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn update(
    pool: &PgPool,
    id: i64,
    data: &OrganizationUpdate,
    now: i64,
) -> ServiceResult<Organization> {
    let row = sqlx::query_as(&format!(
        "UPDATE organizations SET
            name = COALESCE($2, name),
            slug = COALESCE($3, slug),
            status = COALESCE($4, status),
            updated_at = $5
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(data.name.as_deref().map(str::trim))
    .bind(data.slug.as_deref())
    .bind(data.status.map(|s| s.as_db()))
    .bind(now)
    .fetch_optional(pool)
    .await?;
    row.ok_or_else(|| AppError::new(ErrorCode::TenantNotFound).into())
}

/// Delete an organization that owns no users or business data
pub async fn delete(pool: &PgPool, id: i64) -> ServiceResult<()> {
    let mut tx = pool.begin().await?;

    let (has_data,): (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS(SELECT 1 FROM users WHERE organization_id = $1)
            OR EXISTS(SELECT 1 FROM customers WHERE organization_id = $1)
            OR EXISTS(SELECT 1 FROM products WHERE organization_id = $1)
            OR EXISTS(SELECT 1 FROM orders WHERE organization_id = $1)
            OR EXISTS(SELECT 1 FROM suppliers WHERE organization_id = $1)
        "#,
    )
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;
    if has_data {
        return Err(AppError::new(ErrorCode::TenantHasData).into());
    }

    let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    super::ensure_affected(result.rows_affected(), || AppError::new(ErrorCode::TenantNotFound))?;

    tx.commit().await?;
    Ok(())
}
