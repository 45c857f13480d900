//! Role permission tables
//!
//! Permissions are `resource:action`. A grant of `resource:*` covers every
//! action of that resource; the grant `all` covers everything.

use shared::models::Role;

/// Platform administrator
pub const SUPER_ADMIN_PERMISSIONS: &[&str] = &["all"];

/// Organization administrator: every tenant-level permission
pub const TENANT_ADMIN_PERMISSIONS: &[&str] = &[
    "users:*",
    "customers:*",
    "products:*",
    "inventory:*",
    "orders:*",
    "payments:*",
    "suppliers:*",
    "purchase_orders:*",
    "invoices:*",
    "tickets:*",
    "campaigns:*",
    "loyalty:*",
    "audit:read",
];

/// Day-to-day operations
pub const STAFF_PERMISSIONS: &[&str] = &[
    "users:read",
    "customers:read",
    "customers:write",
    "products:read",
    "inventory:read",
    "inventory:adjust",
    "orders:read",
    "orders:write",
    "orders:manage",
    "payments:read",
    "payments:write",
    "suppliers:read",
    "purchase_orders:read",
    "purchase_orders:receive",
    "invoices:read",
    "tickets:*",
    "campaigns:read",
    "loyalty:read",
];

/// Storefront customer, further narrowed to their own records
pub const CUSTOMER_PERMISSIONS: &[&str] = &[
    "products:read",
    "orders:read",
    "orders:write",
    "tickets:read",
    "tickets:write",
    "loyalty:read",
];

/// Grants of a role
pub fn permissions_for(role: Role) -> &'static [&'static str] {
    match role {
        Role::SuperAdmin => SUPER_ADMIN_PERMISSIONS,
        Role::TenantAdmin => TENANT_ADMIN_PERMISSIONS,
        Role::Staff => STAFF_PERMISSIONS,
        Role::Customer => CUSTOMER_PERMISSIONS,
    }
}

/// Does a single grant cover the permission
pub fn grant_matches(grant: &str, permission: &str) -> bool {
    if grant == "all" || grant == permission {
        return true;
    }
    // "products:*" matches "products:read"
    match grant.strip_suffix(":*") {
        Some(prefix) => permission
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with(':')),
        None => false,
    }
}

pub fn role_has_permission(role: Role, permission: &str) -> bool {
    permissions_for(role)
        .iter()
        .any(|grant| grant_matches(grant, permission))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_matching() {
        assert!(grant_matches("all", "organizations:manage"));
        assert!(grant_matches("products:*", "products:write"));
        assert!(grant_matches("orders:read", "orders:read"));
        assert!(!grant_matches("orders:read", "orders:write"));
        // prefix must end at the separator
        assert!(!grant_matches("order:*", "orders:read"));
        assert!(!grant_matches("products:*", "products"));
    }

    #[test]
    fn test_super_admin_has_everything() {
        for p in ["organizations:manage", "audit:read", "loyalty:adjust"] {
            assert!(role_has_permission(Role::SuperAdmin, p));
        }
    }

    #[test]
    fn test_tenant_admin() {
        assert!(role_has_permission(Role::TenantAdmin, "users:manage"));
        assert!(role_has_permission(Role::TenantAdmin, "payments:refund"));
        assert!(role_has_permission(Role::TenantAdmin, "loyalty:adjust"));
        assert!(role_has_permission(Role::TenantAdmin, "audit:read"));
        assert!(!role_has_permission(Role::TenantAdmin, "organizations:manage"));
    }

    #[test]
    fn test_staff() {
        assert!(role_has_permission(Role::Staff, "orders:manage"));
        assert!(role_has_permission(Role::Staff, "inventory:adjust"));
        assert!(role_has_permission(Role::Staff, "tickets:write"));
        assert!(role_has_permission(Role::Staff, "purchase_orders:receive"));
        assert!(!role_has_permission(Role::Staff, "users:manage"));
        assert!(!role_has_permission(Role::Staff, "payments:refund"));
        assert!(!role_has_permission(Role::Staff, "products:write"));
        assert!(!role_has_permission(Role::Staff, "purchase_orders:write"));
        assert!(!role_has_permission(Role::Staff, "audit:read"));
    }

    #[test]
    fn test_customer() {
        assert!(role_has_permission(Role::Customer, "products:read"));
        assert!(role_has_permission(Role::Customer, "orders:write"));
        assert!(!role_has_permission(Role::Customer, "orders:manage"));
        assert!(!role_has_permission(Role::Customer, "customers:read"));
        assert!(!role_has_permission(Role::Customer, "payments:read"));
        assert!(!role_has_permission(Role::Customer, "loyalty:adjust"));
    }
}
