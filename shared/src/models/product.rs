//! Product and inventory models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub organization_id: i64,
    /// Unique within the organization
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub cost: Decimal,
    /// Units on hand, never negative
    pub stock: i32,
    /// Low-stock threshold
    pub reorder_level: i32,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub cost: Option<Decimal>,
    pub stock: Option<i32>,
    pub reorder_level: Option<i32>,
}

/// Update product payload
///
/// Stock is not editable here; it moves through stock adjustments, sales
/// and purchase receipts so every change leaves a movement record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub cost: Option<Decimal>,
    pub reorder_level: Option<i32>,
    pub is_active: Option<bool>,
}

/// Why stock moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementReason {
    /// Manual correction
    Adjustment,
    /// Sold through an order
    Sale,
    /// Order cancelled, stock restored
    OrderCancelled,
    /// Purchase order received
    PurchaseReceived,
}

impl MovementReason {
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Adjustment => "adjustment",
            Self::Sale => "sale",
            Self::OrderCancelled => "order_cancelled",
            Self::PurchaseReceived => "purchase_received",
        }
    }
}

/// Inventory movement (append-only stock ledger)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct InventoryMovement {
    pub id: i64,
    pub organization_id: i64,
    pub product_id: i64,
    /// Signed change in units
    pub delta: i32,
    pub reason: String,
    /// Free text or document number (order, purchase order)
    pub reference: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: i64,
}

/// Manual stock adjustment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub delta: i32,
    pub reference: Option<String>,
}
