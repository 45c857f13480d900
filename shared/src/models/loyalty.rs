//! Loyalty Model

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Loyalty account (one per customer)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LoyaltyAccount {
    pub id: i64,
    pub organization_id: i64,
    pub customer_id: i64,
    /// Never negative
    pub points_balance: i64,
    /// Total points ever credited
    pub lifetime_points: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Loyalty ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LoyaltyTransaction {
    pub id: i64,
    pub organization_id: i64,
    pub account_id: i64,
    pub delta: i64,
    pub reason: String,
    pub order_id: Option<i64>,
    pub created_by: Option<i64>,
    pub created_at: i64,
}

/// Manual points adjustment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoyaltyAdjust {
    pub delta: i64,
    pub reason: String,
}

/// Points earned for a settled order: one point per whole currency unit
pub fn points_for_total(total: Decimal) -> i64 {
    if total.is_sign_negative() {
        return 0;
    }
    total.floor().to_i64().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_points_for_total() {
        let d = |s: &str| Decimal::from_str(s).unwrap();
        assert_eq!(points_for_total(d("99.99")), 99);
        assert_eq!(points_for_total(d("100.00")), 100);
        assert_eq!(points_for_total(d("0.50")), 0);
        assert_eq!(points_for_total(d("-5")), 0);
    }
}
