//! Support ticket operations

use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    SupportTicket, TicketComment, TicketCreate, TicketPriority, TicketStatus, TicketUpdate,
};
use shared::response::PageRequest;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use super::users;
use crate::ServiceResult;
use crate::auth::OrgScope;

const COLUMNS: &str = "id, organization_id, subject, description, status, priority, customer_id, \
                       assignee_id, created_by, created_at, updated_at, resolved_at";

const COMMENT_COLUMNS: &str = "id, organization_id, ticket_id, author_id, body, created_at";

#[derive(Debug, Default, Deserialize)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub assignee_id: Option<i64>,
    pub customer_id: Option<i64>,
}

fn push_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    scope: OrgScope,
    customer_scope: Option<i64>,
    filter: &TicketFilter,
) {
    scope.push_org_filter(qb, "organization_id");
    if let Some(customer_id) = customer_scope.or(filter.customer_id) {
        qb.push(" AND customer_id = ").push_bind(customer_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_db());
    }
    if let Some(priority) = filter.priority {
        qb.push(" AND priority = ").push_bind(priority.as_db());
    }
    if let Some(assignee_id) = filter.assignee_id {
        qb.push(" AND assignee_id = ").push_bind(assignee_id);
    }
}

pub async fn list(
    pool: &PgPool,
    scope: OrgScope,
    customer_scope: Option<i64>,
    filter: &TicketFilter,
    page: &PageRequest,
) -> ServiceResult<(Vec<SupportTicket>, i64)> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM support_tickets WHERE TRUE");
    push_filters(&mut count, scope, customer_scope, filter);
    let (total,): (i64,) = count.build_query_as().fetch_one(pool).await?;

    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM support_tickets WHERE TRUE"));
    push_filters(&mut qb, scope, customer_scope, filter);
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows = qb.build_query_as().fetch_all(pool).await?;
    Ok((rows, total))
}

async fn select_one(
    conn: &mut PgConnection,
    scope: OrgScope,
    customer_scope: Option<i64>,
    id: i64,
    for_update: bool,
) -> ServiceResult<Option<SupportTicket>> {
    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM support_tickets WHERE id = "));
    qb.push_bind(id);
    scope.push_org_filter(&mut qb, "organization_id");
    if let Some(customer_id) = customer_scope {
        qb.push(" AND customer_id = ").push_bind(customer_id);
    }
    if for_update {
        qb.push(" FOR UPDATE");
    }
    let row = qb.build_query_as().fetch_optional(&mut *conn).await?;
    Ok(row)
}

pub async fn find_by_id(
    pool: &PgPool,
    scope: OrgScope,
    customer_scope: Option<i64>,
    id: i64,
) -> ServiceResult<Option<SupportTicket>> {
    let mut conn = pool.acquire().await?;
    select_one(&mut conn, scope, customer_scope, id, false).await
}

async fn check_assignee(
    conn: &mut PgConnection,
    organization_id: i64,
    assignee_id: i64,
) -> ServiceResult<()> {
    if !users::is_active_member(conn, organization_id, assignee_id).await? {
        return Err(AppError::new(ErrorCode::AssigneeNotFound)
            .with_detail("assignee_id", assignee_id)
            .into());
    }
    Ok(())
}

pub async fn create(
    pool: &PgPool,
    organization_id: i64,
    data: &TicketCreate,
    created_by: i64,
    now: i64,
) -> ServiceResult<SupportTicket> {
    let mut tx = pool.begin().await?;

    if let Some(customer_id) = data.customer_id
        && !super::exists_in_org(&mut tx, "customers", customer_id, organization_id).await?
    {
        return Err(AppError::new(ErrorCode::CustomerNotFound).into());
    }
    if let Some(assignee_id) = data.assignee_id {
        check_assignee(&mut tx, organization_id, assignee_id).await?;
    }

    let ticket = sqlx::query_as(&format!(
        "INSERT INTO support_tickets (organization_id, subject, description, status, priority,
                                      customer_id, assignee_id, created_by, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
         RETURNING {COLUMNS}"
    ))
    .bind(organization_id)
    .bind(&data.subject)
    .bind(&data.description)
    .bind(TicketStatus::Open.as_db())
    .bind(data.priority.unwrap_or(TicketPriority::Normal).as_db())
    .bind(data.customer_id)
    .bind(data.assignee_id)
    .bind(created_by)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(ticket)
}

/// Update fields and/or move the ticket through its workflow
pub async fn update(
    pool: &PgPool,
    scope: OrgScope,
    customer_scope: Option<i64>,
    id: i64,
    data: &TicketUpdate,
    now: i64,
) -> ServiceResult<SupportTicket> {
    let mut tx = pool.begin().await?;
    let Some(ticket) = select_one(&mut tx, scope, customer_scope, id, true).await? else {
        return Err(AppError::new(ErrorCode::TicketNotFound).into());
    };

    if let Some(assignee_id) = data.assignee_id {
        check_assignee(&mut tx, ticket.organization_id, assignee_id).await?;
    }

    let mut qb = QueryBuilder::new("UPDATE support_tickets SET updated_at = ");
    qb.push_bind(now);

    if let Some(next) = data.status {
        let current = TicketStatus::from_db(&ticket.status)
            .ok_or_else(|| AppError::internal(format!("Unknown ticket status: {}", ticket.status)))?;
        if next != current {
            if !current.can_transition_to(next) {
                return Err(AppError::invalid_transition(current.as_db(), next.as_db()).into());
            }
            qb.push(", status = ").push_bind(next.as_db());
            match next {
                TicketStatus::Resolved => {
                    qb.push(", resolved_at = ").push_bind(now);
                }
                TicketStatus::Open | TicketStatus::InProgress => {
                    qb.push(", resolved_at = NULL");
                }
                TicketStatus::Closed => {}
            }
        }
    }
    if let Some(subject) = &data.subject {
        qb.push(", subject = ").push_bind(subject);
    }
    if let Some(description) = &data.description {
        qb.push(", description = ").push_bind(description);
    }
    if let Some(priority) = data.priority {
        qb.push(", priority = ").push_bind(priority.as_db());
    }
    if let Some(assignee_id) = data.assignee_id {
        qb.push(", assignee_id = ").push_bind(assignee_id);
    }
    qb.push(" WHERE id = ").push_bind(ticket.id);
    qb.push(format!(" RETURNING {COLUMNS}"));

    let updated = qb.build_query_as().fetch_one(&mut *tx).await?;
    tx.commit().await?;
    Ok(updated)
}

pub async fn list_comments(
    pool: &PgPool,
    ticket_id: i64,
) -> ServiceResult<Vec<TicketComment>> {
    let rows = sqlx::query_as(&format!(
        "SELECT {COMMENT_COLUMNS} FROM ticket_comments WHERE ticket_id = $1 ORDER BY created_at, id"
    ))
    .bind(ticket_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn add_comment(
    pool: &PgPool,
    ticket: &SupportTicket,
    author_id: i64,
    body: &str,
    now: i64,
) -> ServiceResult<TicketComment> {
    let mut tx = pool.begin().await?;
    let comment = sqlx::query_as(&format!(
        "INSERT INTO ticket_comments (organization_id, ticket_id, author_id, body, created_at)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {COMMENT_COLUMNS}"
    ))
    .bind(ticket.organization_id)
    .bind(ticket.id)
    .bind(author_id)
    .bind(body)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE support_tickets SET updated_at = $2 WHERE id = $1")
        .bind(ticket.id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(comment)
}
