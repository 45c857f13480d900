//! Database access layer
//!
//! One module per resource. Tenant-owned queries take an
//! [`OrgScope`](crate::auth::OrgScope) and filter through
//! `push_org_filter`; inserts take the resolved write organization.
//! Multi-row writes take a `&mut PgConnection` so callers can run them
//! inside a transaction.

pub mod audit;
pub mod campaigns;
pub mod customers;
pub mod invoices;
pub mod loyalty;
pub mod orders;
pub mod organizations;
pub mod payments;
pub mod products;
pub mod purchase_orders;
pub mod suppliers;
pub mod tickets;
pub mod users;

use shared::error::AppError;
use sqlx::PgConnection;

use crate::ServiceResult;

/// Escape `%`/`_` and wrap for a case-insensitive `ILIKE` search
pub(crate) fn like_pattern(q: &str) -> String {
    let escaped = q
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Zero affected rows means the target is outside the caller's scope
pub(crate) fn ensure_affected(rows: u64, not_found: impl FnOnce() -> AppError) -> ServiceResult<()> {
    if rows == 0 {
        return Err(not_found().into());
    }
    Ok(())
}

/// Does `table.id` exist in the organization
///
/// `table` is always a literal from this crate.
pub(crate) async fn exists_in_org(
    conn: &mut PgConnection,
    table: &'static str,
    id: i64,
    organization_id: i64,
) -> ServiceResult<bool> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = $1 AND organization_id = $2)");
    let (exists,): (bool,) = sqlx::query_as(&sql)
        .bind(id)
        .bind(organization_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(exists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("ab"), "%ab%");
        assert_eq!(like_pattern(" 50%_off "), "%50\\%\\_off%");
    }

    #[test]
    fn test_ensure_affected() {
        assert!(ensure_affected(1, || AppError::not_found("Customer")).is_ok());
        let err: AppError = ensure_affected(0, || AppError::new(ErrorCode::CustomerNotFound))
            .unwrap_err()
            .into();
        assert_eq!(err.code, ErrorCode::CustomerNotFound);
    }
}
