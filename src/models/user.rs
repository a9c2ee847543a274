use serde::{Deserialize, Serialize};

use crate::constants::{GOLD_TIER_POINTS, MAX_ID_LENGTH, PLATINUM_TIER_POINTS, SILVER_TIER_POINTS};

/// Green Tier label derived from lifetime earned points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum GreenTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl GreenTier {
    /// Tier for a lifetime total of earned (positive) points
    pub fn for_lifetime_points(points: i64) -> Self {
        if points >= PLATINUM_TIER_POINTS {
            GreenTier::Platinum
        } else if points >= GOLD_TIER_POINTS {
            GreenTier::Gold
        } else if points >= SILVER_TIER_POINTS {
            GreenTier::Silver
        } else {
            GreenTier::Bronze
        }
    }

    /// Points needed to reach the next tier, `None` at the top
    pub fn next_threshold(self) -> Option<i64> {
        match self {
            GreenTier::Bronze => Some(SILVER_TIER_POINTS),
            GreenTier::Silver => Some(GOLD_TIER_POINTS),
            GreenTier::Gold => Some(PLATINUM_TIER_POINTS),
            GreenTier::Platinum => None,
        }
    }
}

/// User row as stored and returned by the API
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    /// Denormalized running balance, always the sum of the user's ledger
    pub eco_points: i64,
    pub green_tier: GreenTier,
    pub carbon_footprint: f64,
    #[serde(serialize_with = "super::rfc3339")]
    pub created_at: i64,
}

impl User {
    /// Validate a user ID: 1-255 characters of ASCII letters, digits, `-` or `_`
    pub fn validate_id(id: &str) -> bool {
        !id.is_empty()
            && id.len() <= MAX_ID_LENGTH
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    /// Validate a username: 3-255 printable characters, no surrounding whitespace
    pub fn validate_username(username: &str) -> bool {
        username.len() >= 3
            && username.len() <= MAX_ID_LENGTH
            && username.trim() == username
            && !username.chars().any(|c| c.is_control())
    }
}
