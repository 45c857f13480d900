//! Organization isolation against a real PostgreSQL database
//!
//! Each test gets a fresh database with the migrations applied
//! (`DATABASE_URL` must point at a server the test user may create databases on).

use commerce_cloud::ServiceError;
use commerce_cloud::auth::OrgScope;
use commerce_cloud::db::users::NewUser;
use commerce_cloud::db::{customers, loyalty, orders, organizations, payments, products, tickets, users};
use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Customer, CustomerCreate, CustomerUpdate, OrderCreate, OrderItemInput, OrderStatus,
    OrganizationCreate, PaymentCreate, PaymentMethod, Product, ProductCreate, Role, TicketCreate,
};
use shared::util::now_millis;
use sqlx::PgPool;

/// One organization with a staff member and a customer
struct Tenant {
    org: i64,
    staff: i64,
    customer: Customer,
}

async fn seed_tenant(pool: &PgPool, slug: &str) -> Tenant {
    let now = now_millis();
    let org = organizations::create(
        pool,
        &OrganizationCreate {
            name: format!("Org {slug}"),
            slug: slug.to_string(),
        },
        now,
    )
    .await
    .unwrap();
    let staff = users::create(
        pool,
        &NewUser {
            email: &format!("staff@{slug}.test"),
            hashed_password: "not-a-real-hash",
            display_name: "Staff",
            role: Role::Staff,
            organization_id: Some(org.id),
            customer_id: None,
        },
        now,
    )
    .await
    .unwrap();
    let customer = customers::create(
        pool,
        org.id,
        &CustomerCreate {
            name: "Ada".into(),
            email: format!("ada@{slug}.test"),
            phone: None,
            address: None,
            notes: None,
        },
        now,
    )
    .await
    .unwrap();
    Tenant {
        org: org.id,
        staff: staff.id,
        customer,
    }
}

async fn seed_product(pool: &PgPool, tenant: &Tenant, sku: &str, price: i64, stock: i32) -> Product {
    products::create(
        pool,
        tenant.org,
        &ProductCreate {
            sku: sku.into(),
            name: format!("Product {sku}"),
            description: None,
            price: Decimal::new(price, 0),
            cost: None,
            stock: Some(stock),
            reorder_level: None,
        },
        tenant.staff,
        now_millis(),
    )
    .await
    .unwrap()
}

fn order_for(tenant: &Tenant, customer_id: Option<i64>) -> orders::OrderOwner {
    orders::OrderOwner {
        organization_id: tenant.org,
        customer_id,
        created_by: tenant.staff,
    }
}

fn items(lines: &[(i64, i32)]) -> Vec<OrderItemInput> {
    lines
        .iter()
        .map(|&(product_id, quantity)| OrderItemInput {
            product_id,
            quantity,
        })
        .collect()
}

fn order_create(customer_id: Option<i64>, lines: &[(i64, i32)], discount: Option<Decimal>) -> OrderCreate {
    OrderCreate {
        customer_id,
        items: items(lines),
        discount,
        tax_rate: None,
        notes: None,
    }
}

fn code_of(err: ServiceError) -> ErrorCode {
    AppError::from(err).code
}

async fn stock_of(pool: &PgPool, product_id: i64) -> i32 {
    products::find_by_id(pool, OrgScope::All, product_id, false)
        .await
        .unwrap()
        .unwrap()
        .stock
}

#[sqlx::test(migrations = "./migrations")]
async fn test_customer_of_other_org_is_invisible(pool: PgPool) {
    let a = seed_tenant(&pool, "alpha").await;
    let b = seed_tenant(&pool, "beta").await;
    let now = now_millis();

    let found = customers::find_by_id(&pool, OrgScope::Org(b.org), a.customer.id)
        .await
        .unwrap();
    assert!(found.is_none(), "org B must not read org A's customer");

    let own = customers::find_by_id(&pool, OrgScope::Org(a.org), a.customer.id)
        .await
        .unwrap();
    assert_eq!(own.map(|c| c.id), Some(a.customer.id));

    // platform administrator without a selection sees both
    let any = customers::find_by_id(&pool, OrgScope::All, b.customer.id)
        .await
        .unwrap();
    assert!(any.is_some());

    let rename = CustomerUpdate {
        name: Some("Mallory".into()),
        ..Default::default()
    };
    let err = customers::update(&pool, OrgScope::Org(b.org), a.customer.id, &rename, now)
        .await
        .unwrap_err();
    assert_eq!(code_of(err), ErrorCode::CustomerNotFound);

    let err = customers::delete(&pool, OrgScope::Org(b.org), a.customer.id)
        .await
        .unwrap_err();
    assert_eq!(code_of(err), ErrorCode::CustomerNotFound);

    let still = customers::find_by_id(&pool, OrgScope::Org(a.org), a.customer.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(still.name, "Ada");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_product_of_other_org_is_invisible(pool: PgPool) {
    let a = seed_tenant(&pool, "alpha").await;
    let b = seed_tenant(&pool, "beta").await;
    let product = seed_product(&pool, &a, "SKU-1", 10, 5).await;

    let found = products::find_by_id(&pool, OrgScope::Org(b.org), product.id, false)
        .await
        .unwrap();
    assert!(found.is_none());

    let err = products::adjust_stock(&pool, OrgScope::Org(b.org), product.id, -5, None, b.staff, now_millis())
        .await
        .unwrap_err();
    assert_eq!(code_of(err), ErrorCode::ProductNotFound);

    let err = products::delete(&pool, OrgScope::Org(b.org), product.id)
        .await
        .unwrap_err();
    assert_eq!(code_of(err), ErrorCode::ProductNotFound);

    assert_eq!(stock_of(&pool, product.id).await, 5);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_order_rejects_foreign_references(pool: PgPool) {
    let a = seed_tenant(&pool, "alpha").await;
    let b = seed_tenant(&pool, "beta").await;
    let own = seed_product(&pool, &a, "SKU-A", 10, 5).await;
    let foreign = seed_product(&pool, &b, "SKU-B", 10, 5).await;

    // customer belongs to org B
    let err = orders::create(
        &pool,
        &order_for(&a, Some(b.customer.id)),
        &order_create(Some(b.customer.id), &[(own.id, 1)], None),
        now_millis(),
    )
    .await
    .unwrap_err();
    assert_eq!(code_of(err), ErrorCode::CustomerNotFound);

    // product belongs to org B
    let err = orders::create(
        &pool,
        &order_for(&a, None),
        &order_create(None, &[(own.id, 1), (foreign.id, 1)], None),
        now_millis(),
    )
    .await
    .unwrap_err();
    let err = AppError::from(err);
    assert_eq!(err.code, ErrorCode::ProductNotFound);
    assert_eq!(err.details.unwrap()["product_id"], foreign.id);

    // nothing was reserved on either side
    assert_eq!(stock_of(&pool, own.id).await, 5);
    assert_eq!(stock_of(&pool, foreign.id).await, 5);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_out_of_stock_rolls_back_every_line(pool: PgPool) {
    let a = seed_tenant(&pool, "alpha").await;
    let plenty = seed_product(&pool, &a, "SKU-1", 10, 50).await;
    let scarce = seed_product(&pool, &a, "SKU-2", 10, 2).await;

    let err = orders::create(
        &pool,
        &order_for(&a, None),
        &order_create(None, &[(plenty.id, 3), (scarce.id, 5)], None),
        now_millis(),
    )
    .await
    .unwrap_err();
    let err = AppError::from(err);
    assert_eq!(err.code, ErrorCode::ProductOutOfStock);
    let details = err.details.unwrap();
    assert_eq!(details["requested"], 5);
    assert_eq!(details["available"], 2);

    assert_eq!(stock_of(&pool, plenty.id).await, 50);
    assert_eq!(stock_of(&pool, scarce.id).await, 2);

    // the exact remaining stock can still be sold
    let detail = orders::create(
        &pool,
        &order_for(&a, None),
        &order_create(None, &[(scarce.id, 2)], None),
        now_millis(),
    )
    .await
    .unwrap();
    assert_eq!(detail.order.total, Decimal::new(20, 0));
    assert_eq!(stock_of(&pool, scarce.id).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_fully_discounted_order_is_created_paid(pool: PgPool) {
    let a = seed_tenant(&pool, "alpha").await;
    let product = seed_product(&pool, &a, "SKU-1", 25, 5).await;

    let detail = orders::create(
        &pool,
        &order_for(&a, Some(a.customer.id)),
        &order_create(Some(a.customer.id), &[(product.id, 2)], Some(Decimal::new(50, 0))),
        now_millis(),
    )
    .await
    .unwrap();
    assert!(detail.order.total.is_zero());
    assert_eq!(detail.order.status, OrderStatus::Paid.as_db());

    // nothing is owed, so payments are refused
    let err = payments::create(
        &pool,
        OrgScope::Org(a.org),
        detail.order.id,
        &PaymentCreate {
            amount: Decimal::ONE,
            method: PaymentMethod::Cash,
            reference: None,
        },
        a.staff,
        now_millis(),
    )
    .await
    .unwrap_err();
    assert_eq!(code_of(err), ErrorCode::OrderAlreadyPaid);

    let fulfilled = orders::change_status(
        &pool,
        OrgScope::Org(a.org),
        detail.order.id,
        OrderStatus::Fulfilled,
        a.staff,
        now_millis(),
    )
    .await
    .unwrap();
    assert_eq!(fulfilled.status, OrderStatus::Fulfilled.as_db());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_payments_are_scoped_to_the_order_org(pool: PgPool) {
    let a = seed_tenant(&pool, "alpha").await;
    let b = seed_tenant(&pool, "beta").await;
    let product = seed_product(&pool, &a, "SKU-1", 40, 5).await;
    let detail = orders::create(
        &pool,
        &order_for(&a, None),
        &order_create(None, &[(product.id, 1)], None),
        now_millis(),
    )
    .await
    .unwrap();
    let payment = PaymentCreate {
        amount: Decimal::new(40, 0),
        method: PaymentMethod::Card,
        reference: None,
    };

    let err = payments::create(&pool, OrgScope::Org(b.org), detail.order.id, &payment, b.staff, now_millis())
        .await
        .unwrap_err();
    assert_eq!(code_of(err), ErrorCode::OrderNotFound);

    let receipt = payments::create(&pool, OrgScope::Org(a.org), detail.order.id, &payment, a.staff, now_millis())
        .await
        .unwrap();
    assert_eq!(receipt.order_status, OrderStatus::Paid.as_db());

    let err = payments::refund(&pool, OrgScope::Org(b.org), receipt.payment.id, b.staff, now_millis())
        .await
        .unwrap_err();
    assert_eq!(code_of(err), ErrorCode::PaymentNotFound);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_refund_reclaims_only_unspent_points(pool: PgPool) {
    let a = seed_tenant(&pool, "alpha").await;
    let product = seed_product(&pool, &a, "SKU-1", 100, 5).await;
    let detail = orders::create(
        &pool,
        &order_for(&a, Some(a.customer.id)),
        &order_create(Some(a.customer.id), &[(product.id, 1)], None),
        now_millis(),
    )
    .await
    .unwrap();

    let receipt = payments::create(
        &pool,
        OrgScope::Org(a.org),
        detail.order.id,
        &PaymentCreate {
            amount: Decimal::new(100, 0),
            method: PaymentMethod::Cash,
            reference: None,
        },
        a.staff,
        now_millis(),
    )
    .await
    .unwrap();
    assert_eq!(receipt.points_awarded, 100);

    // customer redeems 60 of the 100 points
    let account = loyalty::adjust(&pool, a.org, a.customer.id, -60, "redeemed", a.staff, now_millis())
        .await
        .unwrap();
    assert_eq!(account.points_balance, 40);

    payments::refund(&pool, OrgScope::Org(a.org), receipt.payment.id, a.staff, now_millis())
        .await
        .unwrap();

    let account = loyalty::find_by_customer(&pool, OrgScope::Org(a.org), a.customer.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.points_balance, 0);

    let order = orders::find_by_id(&pool, OrgScope::Org(a.org), None, detail.order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Pending.as_db());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_loyalty_and_tickets_reject_other_org_members(pool: PgPool) {
    let a = seed_tenant(&pool, "alpha").await;
    let b = seed_tenant(&pool, "beta").await;

    let err = loyalty::adjust(&pool, a.org, b.customer.id, 10, "goodwill", a.staff, now_millis())
        .await
        .unwrap_err();
    assert_eq!(code_of(err), ErrorCode::CustomerNotFound);
    let account = loyalty::find_by_customer(&pool, OrgScope::Org(a.org), b.customer.id)
        .await
        .unwrap();
    assert!(account.is_none());

    let ticket = TicketCreate {
        subject: "Late delivery".into(),
        description: "Parcel has not arrived".into(),
        priority: None,
        customer_id: Some(a.customer.id),
        assignee_id: Some(b.staff),
    };
    let err = tickets::create(&pool, a.org, &ticket, a.staff, now_millis())
        .await
        .unwrap_err();
    assert_eq!(code_of(err), ErrorCode::AssigneeNotFound);

    let ticket = TicketCreate {
        assignee_id: Some(a.staff),
        ..ticket
    };
    let created = tickets::create(&pool, a.org, &ticket, a.staff, now_millis())
        .await
        .unwrap();
    let hidden = tickets::find_by_id(&pool, OrgScope::Org(b.org), None, created.id)
        .await
        .unwrap();
    assert!(hidden.is_none());
}
