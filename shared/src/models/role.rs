//! Role Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Platform role. Stored and transported as `SCREAMING_SNAKE_CASE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Platform operator, belongs to no organization
    SuperAdmin,
    /// Full control of one organization
    TenantAdmin,
    /// Operational access within one organization
    Staff,
    /// Shopper account linked to a customer record
    Customer,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::SuperAdmin,
        Role::TenantAdmin,
        Role::Staff,
        Role::Customer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "SUPER_ADMIN",
            Self::TenantAdmin => "TENANT_ADMIN",
            Self::Staff => "STAFF",
            Self::Customer => "CUSTOMER",
        }
    }

    pub fn is_super_admin(&self) -> bool {
        matches!(self, Self::SuperAdmin)
    }

    /// Every role except SUPER_ADMIN lives inside exactly one organization
    pub fn requires_organization(&self) -> bool {
        !self.is_super_admin()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown role name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roles() {
        assert_eq!("SUPER_ADMIN".parse::<Role>().unwrap(), Role::SuperAdmin);
        assert_eq!("TENANT_ADMIN".parse::<Role>().unwrap(), Role::TenantAdmin);
        assert_eq!("STAFF".parse::<Role>().unwrap(), Role::Staff);
        assert_eq!("CUSTOMER".parse::<Role>().unwrap(), Role::Customer);
        assert!("staff".parse::<Role>().is_err());
        assert!("ADMIN".parse::<Role>().is_err());
    }

    #[test]
    fn test_serde_matches_as_str() {
        for role in Role::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
    }

    #[test]
    fn test_requires_organization() {
        assert!(!Role::SuperAdmin.requires_organization());
        assert!(Role::TenantAdmin.requires_organization());
        assert!(Role::Staff.requires_organization());
        assert!(Role::Customer.requires_organization());
    }
}
