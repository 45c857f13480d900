//! Organization Model (tenant)

use serde::{Deserialize, Serialize};

/// Organization lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationStatus {
    Active,
    /// Members can no longer sign in
    Suspended,
}

impl OrganizationStatus {
    /// Parse from database string value
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "suspended" => Some(Self::Suspended),
            _ => None,
        }
    }

    /// Database string representation
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
        }
    }

    /// Can members of this organization sign in?
    pub fn can_login(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Organization entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub status: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create organization payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationCreate {
    pub name: String,
    pub slug: String,
}

/// Update organization payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizationUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub status: Option<OrganizationStatus>,
}

/// A slug is 2-64 chars of lowercase ascii letters, digits and inner hyphens
pub fn is_valid_slug(slug: &str) -> bool {
    let len_ok = (2..=64).contains(&slug.len());
    let chars_ok = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    len_ok && chars_ok && !slug.starts_with('-') && !slug.ends_with('-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_db_roundtrip() {
        for status in [OrganizationStatus::Active, OrganizationStatus::Suspended] {
            assert_eq!(OrganizationStatus::from_db(status.as_db()), Some(status));
        }
        assert_eq!(OrganizationStatus::from_db("ACTIVE"), None);
    }

    #[test]
    fn test_only_active_can_login() {
        assert!(OrganizationStatus::Active.can_login());
        assert!(!OrganizationStatus::Suspended.can_login());
    }

    #[test]
    fn test_slug_validation() {
        assert!(is_valid_slug("acme"));
        assert!(is_valid_slug("acme-store-2"));
        assert!(!is_valid_slug("a"));
        assert!(!is_valid_slug("Acme"));
        assert!(!is_valid_slug("-acme"));
        assert!(!is_valid_slug("acme_store"));
    }
}
