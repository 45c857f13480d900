//! Organization scope resolution
//!
//! Every tenant-owned query is filtered through an [`OrgScope`]. Regular
//! users are pinned to their own organization. A platform administrator
//! sees every organization unless the request selects one with the
//! `x-organization-id` header.

use axum::extract::FromRequestParts;
use http::HeaderValue;
use http::request::Parts;
use shared::error::{AppError, ErrorCode};
use shared::models::Role;
use sqlx::{Postgres, QueryBuilder};

use super::CurrentUser;
use crate::security_log;

/// Header a platform administrator uses to select an organization
pub const ORGANIZATION_HEADER: &str = "x-organization-id";

/// Organization filter applied to queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrgScope {
    /// No filter (platform administrator without a selection)
    All,
    Org(i64),
}

impl OrgScope {
    pub fn org_id(&self) -> Option<i64> {
        match self {
            Self::All => None,
            Self::Org(id) => Some(*id),
        }
    }

    /// Append `AND <column> = $n` for a single organization
    ///
    /// The builder must already be inside a `WHERE` clause.
    pub fn push_org_filter(&self, qb: &mut QueryBuilder<'_, Postgres>, column: &str) {
        if let Self::Org(id) = self {
            qb.push(" AND ").push(column).push(" = ").push_bind(*id);
        }
    }
}

/// Caller identity plus the organization scope of the request
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub user: CurrentUser,
    pub scope: OrgScope,
}

impl TenantContext {
    /// Resolve the scope from the caller and the optional selection header
    pub fn resolve(user: CurrentUser, header: Option<&HeaderValue>) -> Result<Self, AppError> {
        let requested = header.map(parse_org_header).transpose()?;

        if user.is_super_admin() {
            let scope = requested.map_or(OrgScope::All, OrgScope::Org);
            return Ok(Self { user, scope });
        }

        let Some(own) = user.organization_id else {
            // Claims validation guarantees an organization for these roles
            return Err(AppError::invalid_token("Token carries no organization"));
        };

        if let Some(requested) = requested
            && requested != own
        {
            security_log!(
                "WARN",
                "cross_tenant_attempt",
                user_id = user.id,
                email = user.email.clone(),
                own_org = own,
                requested_org = requested
            );
            return Err(AppError::permission_denied(
                "Access to another organization is not allowed",
            ));
        }

        Ok(Self {
            user,
            scope: OrgScope::Org(own),
        })
    }

    /// Organization that receives new rows
    pub fn write_org(&self) -> Result<i64, AppError> {
        self.scope.org_id().ok_or_else(|| {
            AppError::with_message(
                ErrorCode::TenantNotSelected,
                format!("Select an organization with the {ORGANIZATION_HEADER} header"),
            )
        })
    }

    /// Customer a CUSTOMER caller is restricted to
    pub fn customer_scope(&self) -> Option<i64> {
        match self.user.role {
            Role::Customer => self.user.customer_id,
            _ => None,
        }
    }

    pub fn is_customer(&self) -> bool {
        self.user.role == Role::Customer
    }

    /// Append `AND <column> = $n` when the caller is a customer
    pub fn push_customer_filter(&self, qb: &mut QueryBuilder<'_, Postgres>, column: &str) {
        if let Some(customer_id) = self.customer_scope() {
            qb.push(" AND ").push(column).push(" = ").push_bind(customer_id);
        }
    }
}

fn parse_org_header(value: &HeaderValue) -> Result<i64, AppError> {
    value
        .to_str()
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::InvalidRequest,
                format!("Invalid {ORGANIZATION_HEADER} header"),
            )
        })
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(AppError::not_authenticated)?;
        Self::resolve(user, parts.headers.get(ORGANIZATION_HEADER))
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(AppError::not_authenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, org: Option<i64>, cid: Option<i64>) -> CurrentUser {
        CurrentUser {
            id: 1,
            email: "u@test".into(),
            role,
            organization_id: org,
            customer_id: cid,
        }
    }

    fn hv(s: &str) -> HeaderValue {
        HeaderValue::from_str(s).unwrap()
    }

    #[test]
    fn test_super_admin_scope() {
        let ctx = TenantContext::resolve(user(Role::SuperAdmin, None, None), None).unwrap();
        assert_eq!(ctx.scope, OrgScope::All);
        assert_eq!(ctx.write_org().unwrap_err().code, ErrorCode::TenantNotSelected);

        let ctx =
            TenantContext::resolve(user(Role::SuperAdmin, None, None), Some(&hv("42"))).unwrap();
        assert_eq!(ctx.scope, OrgScope::Org(42));
        assert_eq!(ctx.write_org().unwrap(), 42);

        let err = TenantContext::resolve(user(Role::SuperAdmin, None, None), Some(&hv("abc")))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRequest);
        assert!(
            TenantContext::resolve(user(Role::SuperAdmin, None, None), Some(&hv("0"))).is_err()
        );
    }

    #[test]
    fn test_tenant_user_pinned_to_own_org() {
        for role in [Role::TenantAdmin, Role::Staff] {
            let ctx = TenantContext::resolve(user(role, Some(7), None), None).unwrap();
            assert_eq!(ctx.scope, OrgScope::Org(7));
            assert_eq!(ctx.write_org().unwrap(), 7);

            // naming the own organization is harmless
            let ctx = TenantContext::resolve(user(role, Some(7), None), Some(&hv("7"))).unwrap();
            assert_eq!(ctx.scope, OrgScope::Org(7));
        }
    }

    #[test]
    fn test_cross_tenant_header_rejected() {
        let err = TenantContext::resolve(user(Role::TenantAdmin, Some(7), None), Some(&hv("8")))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
        assert_eq!(err.http_status(), http::StatusCode::FORBIDDEN);

        let err = TenantContext::resolve(user(Role::Customer, Some(7), Some(3)), Some(&hv("8")))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }

    #[test]
    fn test_customer_scope() {
        let ctx = TenantContext::resolve(user(Role::Customer, Some(7), Some(3)), None).unwrap();
        assert!(ctx.is_customer());
        assert_eq!(ctx.customer_scope(), Some(3));

        let ctx = TenantContext::resolve(user(Role::Staff, Some(7), None), None).unwrap();
        assert_eq!(ctx.customer_scope(), None);
    }

    #[test]
    fn test_push_org_filter() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT id FROM orders WHERE TRUE");
        OrgScope::Org(5).push_org_filter(&mut qb, "organization_id");
        assert_eq!(qb.sql(), "SELECT id FROM orders WHERE TRUE AND organization_id = $1");

        let mut qb = QueryBuilder::<Postgres>::new("SELECT id FROM orders WHERE TRUE");
        OrgScope::All.push_org_filter(&mut qb, "organization_id");
        assert_eq!(qb.sql(), "SELECT id FROM orders WHERE TRUE");
    }

    #[test]
    fn test_push_customer_filter() {
        let ctx = TenantContext::resolve(user(Role::Customer, Some(7), Some(3)), None).unwrap();
        let mut qb = QueryBuilder::<Postgres>::new("SELECT id FROM orders WHERE TRUE");
        ctx.scope.push_org_filter(&mut qb, "o.organization_id");
        ctx.push_customer_filter(&mut qb, "o.customer_id");
        assert_eq!(
            qb.sql(),
            "SELECT id FROM orders WHERE TRUE AND o.organization_id = $1 AND o.customer_id = $2"
        );
    }
}
