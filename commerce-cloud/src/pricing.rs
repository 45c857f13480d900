//! Money calculations for orders and payments
//!
//! All arithmetic is `rust_decimal::Decimal`, rounded to 2 places half away
//! from zero at each stored amount.

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::util::round_money;

const HUNDRED: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Largest amount a `NUMERIC(12,2)` column holds: 9 999 999 999.99
pub const MAX_STORED_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

/// Reject an amount the money columns cannot store
fn ensure_storable(value: Decimal, field: &'static str) -> Result<Decimal, AppError> {
    if value > MAX_STORED_AMOUNT {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("{field} exceeds the maximum of {MAX_STORED_AMOUNT}"),
        )
        .with_detail("field", field)
        .with_detail("value", value.to_string()));
    }
    Ok(value)
}

/// Totals of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub tax_rate: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// Nothing is owed: the order is settled on creation
    pub fn is_settled(&self) -> bool {
        self.total.is_zero()
    }
}

/// `quantity × unit_price`, rounded
pub fn line_total(unit_price: Decimal, quantity: i32) -> Result<Decimal, AppError> {
    ensure_storable(round_money(unit_price * Decimal::from(quantity)), "line_total")
}

/// Sum of line totals for a document without discount or tax
pub fn document_total(line_totals: impl IntoIterator<Item = Decimal>) -> Result<Decimal, AppError> {
    ensure_storable(round_money(line_totals.into_iter().sum()), "total")
}

/// Compute order totals from line totals
///
/// `subtotal = Σ lines`, `tax = (subtotal − discount) · rate / 100`,
/// `total = subtotal − discount + tax`.
pub fn order_totals(
    line_totals: impl IntoIterator<Item = Decimal>,
    discount: Decimal,
    tax_rate: Decimal,
) -> Result<OrderTotals, AppError> {
    if discount.is_sign_negative() {
        return Err(AppError::with_message(
            ErrorCode::InvalidAmount,
            "discount must not be negative",
        ));
    }
    if tax_rate.is_sign_negative() || tax_rate > HUNDRED {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "tax_rate must be between 0 and 100",
        ));
    }

    let subtotal = ensure_storable(round_money(line_totals.into_iter().sum()), "subtotal")?;
    let discount = round_money(discount);
    if discount > subtotal {
        return Err(AppError::new(ErrorCode::OrderInvalidDiscount)
            .with_detail("subtotal", subtotal.to_string())
            .with_detail("discount", discount.to_string()));
    }

    let taxable = subtotal - discount;
    let tax = round_money(taxable * tax_rate / HUNDRED);
    let total = ensure_storable(taxable + tax, "total")?;
    Ok(OrderTotals {
        subtotal,
        discount,
        tax_rate,
        tax,
        total,
    })
}

/// Amount still owed on an order
pub fn balance(total: Decimal, paid: Decimal) -> Decimal {
    (total - paid).max(Decimal::ZERO)
}

/// Validate a new payment against what is already paid
///
/// Returns the cumulative paid amount including the new payment.
pub fn apply_payment(total: Decimal, paid: Decimal, amount: Decimal) -> Result<Decimal, AppError> {
    if amount <= Decimal::ZERO {
        return Err(AppError::with_message(
            ErrorCode::InvalidAmount,
            "amount must be positive",
        ));
    }
    let amount = round_money(amount);
    let new_paid = paid + amount;
    if new_paid > total {
        return Err(AppError::new(ErrorCode::PaymentExceedsBalance)
            .with_detail("balance", balance(total, paid).to_string())
            .with_detail("amount", amount.to_string()));
    }
    Ok(new_paid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{MAX_AMOUNT, MAX_QUANTITY};
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line_total(d("19.99"), 3).unwrap(), d("59.97"));
        assert_eq!(line_total(d("0.333"), 3).unwrap(), d("1.00"));
    }

    #[test]
    fn test_max_stored_amount() {
        assert_eq!(MAX_STORED_AMOUNT, d("9999999999.99"));
    }

    #[test]
    fn test_line_total_beyond_column_range() {
        // largest accepted price and quantity
        let err = line_total(MAX_AMOUNT, MAX_QUANTITY).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);
        assert_eq!(err.http_status(), http::StatusCode::BAD_REQUEST);
        assert_eq!(err.details.unwrap()["field"], "line_total");

        assert!(line_total(MAX_AMOUNT, 1000).is_err());
        assert_eq!(line_total(MAX_AMOUNT, 999).unwrap(), d("9990000000.00"));
        assert_eq!(line_total(d("0.01"), 1).unwrap(), d("0.01"));
    }

    #[test]
    fn test_totals_at_column_boundary() {
        let t = order_totals([MAX_STORED_AMOUNT], Decimal::ZERO, Decimal::ZERO).unwrap();
        assert_eq!(t.total, MAX_STORED_AMOUNT);

        // two storable lines whose sum is not
        let err = order_totals([d("9990000000"), d("10000000")], Decimal::ZERO, Decimal::ZERO)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);
        assert_eq!(err.details.unwrap()["field"], "subtotal");

        // tax pushes the total over
        let err = order_totals([MAX_STORED_AMOUNT], Decimal::ZERO, d("1")).unwrap_err();
        assert_eq!(err.details.unwrap()["field"], "total");

        assert_eq!(document_total([d("1.10"), d("2.20")]).unwrap(), d("3.30"));
        assert!(document_total([MAX_STORED_AMOUNT, d("0.01")]).is_err());
    }

    #[test]
    fn test_zero_total_is_settled() {
        let t = order_totals([d("5")], d("5"), Decimal::ZERO).unwrap();
        assert_eq!(t.total, Decimal::ZERO);
        assert!(t.is_settled());

        let t = order_totals([d("5")], d("4.99"), Decimal::ZERO).unwrap();
        assert!(!t.is_settled());
    }

    #[test]
    fn test_order_totals() {
        let t = order_totals([d("59.97"), d("10.03")], d("10"), d("21")).unwrap();
        assert_eq!(t.subtotal, d("70.00"));
        assert_eq!(t.discount, d("10"));
        assert_eq!(t.tax, d("12.60"));
        assert_eq!(t.total, d("72.60"));
    }

    #[test]
    fn test_order_totals_tax_rounding() {
        // 9.99 * 7.5% = 0.74925 → 0.75
        let t = order_totals([d("9.99")], Decimal::ZERO, d("7.5")).unwrap();
        assert_eq!(t.tax, d("0.75"));
        assert_eq!(t.total, d("10.74"));
    }

    #[test]
    fn test_discount_cannot_exceed_subtotal() {
        let err = order_totals([d("5")], d("5.01"), Decimal::ZERO).unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderInvalidDiscount);

        // full discount is allowed
        let t = order_totals([d("5")], d("5"), d("10")).unwrap();
        assert_eq!(t.total, Decimal::ZERO);
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(
            order_totals([d("5")], d("-1"), Decimal::ZERO).unwrap_err().code,
            ErrorCode::InvalidAmount
        );
        assert_eq!(
            order_totals([d("5")], Decimal::ZERO, d("101")).unwrap_err().code,
            ErrorCode::ValueOutOfRange
        );
    }

    #[test]
    fn test_apply_payment() {
        assert_eq!(apply_payment(d("100"), d("0"), d("40")).unwrap(), d("40"));
        assert_eq!(apply_payment(d("100"), d("40"), d("60")).unwrap(), d("100"));

        let err = apply_payment(d("100"), d("40"), d("60.01")).unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentExceedsBalance);
        assert_eq!(err.details.unwrap()["balance"], "60");

        assert_eq!(
            apply_payment(d("100"), d("0"), d("0")).unwrap_err().code,
            ErrorCode::InvalidAmount
        );
    }

    #[test]
    fn test_balance_never_negative() {
        assert_eq!(balance(d("10"), d("4")), d("6"));
        assert_eq!(balance(d("10"), d("12")), Decimal::ZERO);
    }
}
