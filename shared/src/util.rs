use rust_decimal::{Decimal, RoundingStrategy};

/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Custom epoch: 2024-01-01 00:00:00 UTC
const EPOCH_MS: i64 = 1_704_067_200_000;

/// Random bits below the timestamp
const RANDOM_BITS: u32 = 22;

/// Generate a Snowflake-style positive i64 for use as a document number suffix.
///
/// Layout (63 bits):
///   - 41 bits: milliseconds since 2024-01-01 UTC (~69 years)
///   - 22 bits: random (about 4.2 million values per ms)
pub fn snowflake_id() -> i64 {
    use rand::Rng;
    let ts = (now_millis() - EPOCH_MS) & 0x1FF_FFFF_FFFF; // 41 bits
    let rand_bits: i64 = rand::thread_rng().gen_range(0..1 << RANDOM_BITS);
    (ts << RANDOM_BITS) | rand_bits
}

/// Human-facing document number, e.g. `ORD-1234567890`
pub fn document_number(prefix: &str) -> String {
    format!("{prefix}-{}", snowflake_id())
}

/// Round a monetary amount to 2 places, half away from zero
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_snowflake_is_positive() {
        let id = snowflake_id();
        assert!(id > 0);
    }

    #[test]
    fn test_snowflake_layout() {
        let before = now_millis() - EPOCH_MS;
        let id = snowflake_id();
        let after = now_millis() - EPOCH_MS;
        let ts = id >> RANDOM_BITS;
        assert!(ts >= before && ts <= after);
    }

    #[test]
    fn test_document_number_prefix() {
        let n = document_number("INV");
        assert!(n.starts_with("INV-"));
        assert!(n[4..].parse::<i64>().is_ok());
    }

    #[test]
    fn test_round_money_half_away_from_zero() {
        let d = |s: &str| Decimal::from_str(s).unwrap();
        assert_eq!(round_money(d("1.005")), d("1.01"));
        assert_eq!(round_money(d("1.004")), d("1.00"));
        assert_eq!(round_money(d("-2.345")), d("-2.35"));
        assert_eq!(round_money(d("10")), d("10"));
    }
}
