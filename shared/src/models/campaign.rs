//! Marketing campaign model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Campaign channel (label only, no delivery integration)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignChannel {
    Email,
    Sms,
    Social,
    Display,
    InStore,
}

impl CampaignChannel {
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
            Self::Social => "social",
            Self::Display => "display",
            Self::InStore => "in_store",
        }
    }
}

/// Campaign status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Scheduled,
    Active,
    Paused,
    Completed,
    Cancelled,
}

impl CampaignStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "scheduled" => Some(Self::Scheduled),
            "active" => Some(Self::Active),
            "paused" => Some(Self::Paused),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(&self, next: CampaignStatus) -> bool {
        use CampaignStatus::*;
        matches!(
            (self, next),
            (Draft, Scheduled | Active | Cancelled)
                | (Scheduled, Draft | Active | Cancelled)
                | (Active, Paused | Completed | Cancelled)
                | (Paused, Active | Completed | Cancelled)
        )
    }
}

/// Campaign entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Campaign {
    pub id: i64,
    pub organization_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub channel: String,
    pub status: String,
    pub budget: Decimal,
    pub starts_at: Option<i64>,
    pub ends_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create campaign payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignCreate {
    pub name: String,
    pub description: Option<String>,
    pub channel: CampaignChannel,
    pub budget: Option<Decimal>,
    pub starts_at: Option<i64>,
    pub ends_at: Option<i64>,
}

/// Update campaign payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub channel: Option<CampaignChannel>,
    pub status: Option<CampaignStatus>,
    pub budget: Option<Decimal>,
    pub starts_at: Option<i64>,
    pub ends_at: Option<i64>,
}

/// A schedule window is valid when both ends are set and it does not end
/// before it starts, or when either end is open
pub fn is_valid_schedule(starts_at: Option<i64>, ends_at: Option<i64>) -> bool {
    match (starts_at, ends_at) {
        (Some(start), Some(end)) => end > start,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CampaignStatus::*;

    #[test]
    fn test_campaign_transitions() {
        assert!(Draft.can_transition_to(Scheduled));
        assert!(Scheduled.can_transition_to(Active));
        assert!(Active.can_transition_to(Paused));
        assert!(Paused.can_transition_to(Active));
        assert!(Active.can_transition_to(Completed));

        assert!(!Draft.can_transition_to(Completed));
        assert!(!Draft.can_transition_to(Paused));
        for next in [Draft, Scheduled, Active, Paused, Completed, Cancelled] {
            assert!(!Completed.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn test_schedule_validation() {
        assert!(is_valid_schedule(None, None));
        assert!(is_valid_schedule(Some(10), None));
        assert!(is_valid_schedule(Some(10), Some(20)));
        assert!(!is_valid_schedule(Some(20), Some(20)));
        assert!(!is_valid_schedule(Some(20), Some(10)));
    }
}
