//! Purchase order operations
//!
//! Receiving an ordered purchase order adds every line to stock and records
//! the inventory movements.

use rust_decimal::Decimal;
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    MovementReason, PurchaseOrder, PurchaseOrderCreate, PurchaseOrderDetail, PurchaseOrderItem,
    PurchaseOrderStatus,
};
use shared::response::PageRequest;
use shared::util::{document_number, round_money};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use super::products;
use crate::ServiceResult;
use crate::auth::OrgScope;
use crate::pricing;

const COLUMNS: &str = "id, organization_id, po_number, supplier_id, status, total, notes, \
                       expected_at, received_at, created_by, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, purchase_order_id, product_id, quantity, unit_cost, line_total";

#[derive(Debug, Default, Deserialize)]
pub struct PurchaseOrderFilter {
    pub status: Option<PurchaseOrderStatus>,
    pub supplier_id: Option<i64>,
}

fn push_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    scope: OrgScope,
    filter: &PurchaseOrderFilter,
) {
    scope.push_org_filter(qb, "organization_id");
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_db());
    }
    if let Some(supplier_id) = filter.supplier_id {
        qb.push(" AND supplier_id = ").push_bind(supplier_id);
    }
}

pub async fn list(
    pool: &PgPool,
    scope: OrgScope,
    filter: &PurchaseOrderFilter,
    page: &PageRequest,
) -> ServiceResult<(Vec<PurchaseOrder>, i64)> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM purchase_orders WHERE TRUE");
    push_filters(&mut count, scope, filter);
    let (total,): (i64,) = count.build_query_as().fetch_one(pool).await?;

    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM purchase_orders WHERE TRUE"));
    push_filters(&mut qb, scope, filter);
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows = qb.build_query_as().fetch_all(pool).await?;
    Ok((rows, total))
}

async fn items_of(
    conn: &mut PgConnection,
    purchase_order_id: i64,
) -> ServiceResult<Vec<PurchaseOrderItem>> {
    let rows = sqlx::query_as(&format!(
        "SELECT {ITEM_COLUMNS} FROM purchase_order_items WHERE purchase_order_id = $1 ORDER BY id"
    ))
    .bind(purchase_order_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

pub async fn find_detail(
    pool: &PgPool,
    scope: OrgScope,
    id: i64,
) -> ServiceResult<Option<PurchaseOrderDetail>> {
    let mut conn = pool.acquire().await?;
    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM purchase_orders WHERE id = "));
    qb.push_bind(id);
    scope.push_org_filter(&mut qb, "organization_id");
    let row: Option<PurchaseOrder> = qb.build_query_as().fetch_optional(&mut *conn).await?;
    let Some(purchase_order) = row else {
        return Ok(None);
    };
    let items = items_of(&mut conn, purchase_order.id).await?;
    Ok(Some(PurchaseOrderDetail {
        purchase_order,
        items,
    }))
}

/// Create a draft purchase order
///
/// Supplier and products must belong to the organization; a missing unit
/// cost defaults to the product's cost.
pub async fn create(
    pool: &PgPool,
    organization_id: i64,
    data: &PurchaseOrderCreate,
    created_by: i64,
    now: i64,
) -> ServiceResult<PurchaseOrderDetail> {
    let mut tx = pool.begin().await?;

    if !super::exists_in_org(&mut tx, "suppliers", data.supplier_id, organization_id).await? {
        return Err(AppError::new(ErrorCode::SupplierNotFound).into());
    }

    let mut product_ids = Vec::with_capacity(data.items.len());
    let mut quantities = Vec::with_capacity(data.items.len());
    let mut unit_costs = Vec::with_capacity(data.items.len());
    let mut line_totals = Vec::with_capacity(data.items.len());
    for item in &data.items {
        let cost: Option<(Decimal,)> =
            sqlx::query_as("SELECT cost FROM products WHERE id = $1 AND organization_id = $2")
                .bind(item.product_id)
                .bind(organization_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((product_cost,)) = cost else {
            return Err(AppError::new(ErrorCode::ProductNotFound)
                .with_detail("product_id", item.product_id)
                .into());
        };
        let unit_cost = round_money(item.unit_cost.unwrap_or(product_cost));
        product_ids.push(item.product_id);
        quantities.push(item.quantity);
        unit_costs.push(unit_cost);
        line_totals.push(pricing::line_total(unit_cost, item.quantity)?);
    }
    let total = pricing::document_total(line_totals.iter().copied())?;

    let purchase_order: PurchaseOrder = sqlx::query_as(&format!(
        "INSERT INTO purchase_orders (organization_id, po_number, supplier_id, status, total, notes,
                                      expected_at, created_by, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
         RETURNING {COLUMNS}"
    ))
    .bind(organization_id)
    .bind(document_number("PO"))
    .bind(data.supplier_id)
    .bind(PurchaseOrderStatus::Draft.as_db())
    .bind(total)
    .bind(&data.notes)
    .bind(data.expected_at)
    .bind(created_by)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    let items = sqlx::query_as(&format!(
        r#"
        INSERT INTO purchase_order_items (purchase_order_id, product_id, quantity, unit_cost, line_total)
        SELECT $1, * FROM UNNEST($2::bigint[], $3::integer[], $4::numeric[], $5::numeric[])
        RETURNING {ITEM_COLUMNS}
        "#
    ))
    .bind(purchase_order.id)
    .bind(&product_ids)
    .bind(&quantities)
    .bind(&unit_costs)
    .bind(&line_totals)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(PurchaseOrderDetail {
        purchase_order,
        items,
    })
}

async fn lock(conn: &mut PgConnection, scope: OrgScope, id: i64) -> ServiceResult<PurchaseOrder> {
    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM purchase_orders WHERE id = "));
    qb.push_bind(id);
    scope.push_org_filter(&mut qb, "organization_id");
    qb.push(" FOR UPDATE");
    let row: Option<PurchaseOrder> = qb.build_query_as().fetch_optional(&mut *conn).await?;
    row.ok_or_else(|| AppError::new(ErrorCode::PurchaseOrderNotFound).into())
}

fn status_of(po: &PurchaseOrder) -> ServiceResult<PurchaseOrderStatus> {
    PurchaseOrderStatus::from_db(&po.status).ok_or_else(|| {
        AppError::internal(format!("Unknown purchase order status: {}", po.status)).into()
    })
}

/// Manual status change; `received` is only reached through [`receive`]
pub async fn change_status(
    pool: &PgPool,
    scope: OrgScope,
    id: i64,
    next: PurchaseOrderStatus,
    now: i64,
) -> ServiceResult<PurchaseOrder> {
    let mut tx = pool.begin().await?;
    let po = lock(&mut tx, scope, id).await?;
    let current = status_of(&po)?;

    if !current.can_transition_to(next) {
        return Err(AppError::invalid_transition(current.as_db(), next.as_db()).into());
    }

    let updated = sqlx::query_as(&format!(
        "UPDATE purchase_orders SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(po.id)
    .bind(next.as_db())
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(updated)
}

/// Receive an ordered purchase order into stock
pub async fn receive(
    pool: &PgPool,
    scope: OrgScope,
    id: i64,
    received_by: i64,
    now: i64,
) -> ServiceResult<PurchaseOrderDetail> {
    let mut tx = pool.begin().await?;
    let po = lock(&mut tx, scope, id).await?;
    let current = status_of(&po)?;

    if current != PurchaseOrderStatus::Ordered {
        return Err(AppError::invalid_transition(
            current.as_db(),
            PurchaseOrderStatus::Received.as_db(),
        )
        .into());
    }

    let items = items_of(&mut tx, po.id).await?;
    for item in &items {
        products::apply_stock_delta(&mut tx, po.organization_id, item.product_id, item.quantity, now)
            .await?;
        products::record_movement(
            &mut tx,
            po.organization_id,
            item.product_id,
            item.quantity,
            MovementReason::PurchaseReceived,
            Some(&po.po_number),
            Some(received_by),
            now,
        )
        .await?;
    }

    let purchase_order = sqlx::query_as(&format!(
        "UPDATE purchase_orders SET status = $2, received_at = $3, updated_at = $3
         WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(po.id)
    .bind(PurchaseOrderStatus::Received.as_db())
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(PurchaseOrderDetail {
        purchase_order,
        items,
    })
}
