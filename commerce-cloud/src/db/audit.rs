//! Audit log operations

use serde::Deserialize;
use shared::models::AuditEntry;
use shared::response::PageRequest;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::ServiceResult;
use crate::auth::OrgScope;

/// One audit record to write
#[derive(Debug)]
pub struct NewAuditEntry<'a> {
    pub organization_id: Option<i64>,
    pub user_id: Option<i64>,
    pub action: &'a str,
    pub resource: &'a str,
    pub resource_id: Option<i64>,
    pub detail: Option<serde_json::Value>,
    pub correlation: Option<String>,
}

/// Write an audit log entry
pub async fn log(pool: &PgPool, entry: &NewAuditEntry<'_>, now: i64) -> ServiceResult<()> {
    sqlx::query(
        "INSERT INTO audit_logs (organization_id, user_id, action, resource, resource_id, detail, correlation, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(entry.organization_id)
    .bind(entry.user_id)
    .bind(entry.action)
    .bind(entry.resource)
    .bind(entry.resource_id)
    .bind(&entry.detail)
    .bind(&entry.correlation)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// `?action=change_status&resource=order&user_id=3`
#[derive(Debug, Default, Deserialize)]
pub struct AuditFilter {
    pub action: Option<String>,
    pub resource: Option<String>,
    pub user_id: Option<i64>,
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, scope: OrgScope, filter: &AuditFilter) {
    scope.push_org_filter(qb, "organization_id");
    if let Some(action) = &filter.action {
        qb.push(" AND action = ").push_bind(action.clone());
    }
    if let Some(resource) = &filter.resource {
        qb.push(" AND resource = ").push_bind(resource.clone());
    }
    if let Some(user_id) = filter.user_id {
        qb.push(" AND user_id = ").push_bind(user_id);
    }
}

/// Query audit log entries (paginated, newest first)
pub async fn query(
    pool: &PgPool,
    scope: OrgScope,
    filter: &AuditFilter,
    page: &PageRequest,
) -> ServiceResult<(Vec<AuditEntry>, i64)> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM audit_logs WHERE TRUE");
    push_filters(&mut count, scope, filter);
    let (total,): (i64,) = count.build_query_as().fetch_one(pool).await?;

    let mut qb = QueryBuilder::new(
        "SELECT id, organization_id, user_id, action, resource, resource_id, detail, correlation, created_at
         FROM audit_logs WHERE TRUE",
    );
    push_filters(&mut qb, scope, filter);
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows = qb.build_query_as().fetch_all(pool).await?;
    Ok((rows, total))
}
