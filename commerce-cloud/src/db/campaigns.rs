//! Marketing campaign operations

use rust_decimal::Decimal;
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{Campaign, CampaignChannel, CampaignCreate, CampaignStatus, CampaignUpdate};
use shared::response::PageRequest;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::ServiceResult;
use crate::auth::OrgScope;

const COLUMNS: &str = "id, organization_id, name, description, channel, status, budget, starts_at, \
                       ends_at, created_at, updated_at";

#[derive(Debug, Default, Deserialize)]
pub struct CampaignFilter {
    pub status: Option<CampaignStatus>,
    pub channel: Option<CampaignChannel>,
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, scope: OrgScope, filter: &CampaignFilter) {
    scope.push_org_filter(qb, "organization_id");
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_db());
    }
    if let Some(channel) = filter.channel {
        qb.push(" AND channel = ").push_bind(channel.as_db());
    }
}

pub async fn list(
    pool: &PgPool,
    scope: OrgScope,
    filter: &CampaignFilter,
    page: &PageRequest,
) -> ServiceResult<(Vec<Campaign>, i64)> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM campaigns WHERE TRUE");
    push_filters(&mut count, scope, filter);
    let (total,): (i64,) = count.build_query_as().fetch_one(pool).await?;

    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM campaigns WHERE TRUE"));
    push_filters(&mut qb, scope, filter);
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows = qb.build_query_as().fetch_all(pool).await?;
    Ok((rows, total))
}

pub async fn find_by_id(pool: &PgPool, scope: OrgScope, id: i64) -> ServiceResult<Option<Campaign>> {
    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM campaigns WHERE id = "));
    qb.push_bind(id);
    scope.push_org_filter(&mut qb, "organization_id");
    let row = qb.build_query_as().fetch_optional(pool).await?;
    Ok(row)
}

pub async fn create(
    pool: &PgPool,
    organization_id: i64,
    data: &CampaignCreate,
    now: i64,
) -> ServiceResult<Campaign> {
    let row = sqlx::query_as(&format!(
        "INSERT INTO campaigns (organization_id, name, description, channel, status, budget,
                                starts_at, ends_at, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
         RETURNING {COLUMNS}"
    ))
    .bind(organization_id)
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.channel.as_db())
    .bind(CampaignStatus::Draft.as_db())
    .bind(data.budget.unwrap_or(Decimal::ZERO))
    .bind(data.starts_at)
    .bind(data.ends_at)
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Update fields; status changes follow the campaign workflow and the
/// resulting schedule must end after it starts
pub async fn update(
    pool: &PgPool,
    scope: OrgScope,
    id: i64,
    data: &CampaignUpdate,
    now: i64,
) -> ServiceResult<Campaign> {
    let mut tx = pool.begin().await?;

    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM campaigns WHERE id = "));
    qb.push_bind(id);
    scope.push_org_filter(&mut qb, "organization_id");
    qb.push(" FOR UPDATE");
    let row: Option<Campaign> = qb.build_query_as().fetch_optional(&mut *tx).await?;
    let Some(campaign) = row else {
        return Err(AppError::new(ErrorCode::CampaignNotFound).into());
    };

    let starts_at = data.starts_at.or(campaign.starts_at);
    let ends_at = data.ends_at.or(campaign.ends_at);
    if !shared::models::is_valid_schedule(starts_at, ends_at) {
        return Err(AppError::new(ErrorCode::CampaignInvalidSchedule).into());
    }

    let mut qb = QueryBuilder::new("UPDATE campaigns SET updated_at = ");
    qb.push_bind(now);
    if let Some(next) = data.status {
        let current = CampaignStatus::from_db(&campaign.status).ok_or_else(|| {
            AppError::internal(format!("Unknown campaign status: {}", campaign.status))
        })?;
        if next != current {
            if !current.can_transition_to(next) {
                return Err(AppError::invalid_transition(current.as_db(), next.as_db()).into());
            }
            qb.push(", status = ").push_bind(next.as_db());
        }
    }
    if let Some(name) = &data.name {
        qb.push(", name = ").push_bind(name);
    }
    if let Some(description) = &data.description {
        qb.push(", description = ").push_bind(description);
    }
    if let Some(channel) = data.channel {
        qb.push(", channel = ").push_bind(channel.as_db());
    }
    if let Some(budget) = data.budget {
        qb.push(", budget = ").push_bind(budget);
    }
    if let Some(starts_at) = data.starts_at {
        qb.push(", starts_at = ").push_bind(starts_at);
    }
    if let Some(ends_at) = data.ends_at {
        qb.push(", ends_at = ").push_bind(ends_at);
    }
    qb.push(" WHERE id = ").push_bind(campaign.id);
    qb.push(format!(" RETURNING {COLUMNS}"));

    let updated = qb.build_query_as().fetch_one(&mut *tx).await?;
    tx.commit().await?;
    Ok(updated)
}

pub async fn delete(pool: &PgPool, scope: OrgScope, id: i64) -> ServiceResult<()> {
    let mut qb = QueryBuilder::new("DELETE FROM campaigns WHERE id = ");
    qb.push_bind(id);
    scope.push_org_filter(&mut qb, "organization_id");
    let result = qb.build().execute(pool).await?;
    super::ensure_affected(result.rows_affected(), || AppError::new(ErrorCode::CampaignNotFound))
}
