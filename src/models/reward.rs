use serde::{Deserialize, Serialize};

use crate::constants::MAX_ID_LENGTH;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum RewardType {
    Voucher,
    Discount,
    Donation,
}

impl RewardType {
    pub fn as_str(self) -> &'static str {
        match self {
            RewardType::Voucher => "voucher",
            RewardType::Discount => "discount",
            RewardType::Donation => "donation",
        }
    }
}

/// Catalog entry that can be bought with EcoPoints
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub reward_type: RewardType,
    pub value: f64,
    pub eco_points_cost: i64,
    pub category: Option<String>,
    #[serde(serialize_with = "super::rfc3339_opt")]
    pub valid_until: Option<i64>,
    pub is_active: bool,
    /// `None` means stock is not tracked
    pub stock_quantity: Option<i64>,
    #[serde(serialize_with = "super::rfc3339")]
    pub created_at: i64,
}

impl Reward {
    pub fn is_expired(&self, now: i64) -> bool {
        self.valid_until.is_some_and(|until| until < now)
    }
}

/// Operator request to add a reward to the catalog
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReward {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub reward_type: RewardType,
    pub value: f64,
    pub eco_points_cost: i64,
    #[serde(default)]
    pub category: Option<String>,
    /// Unix timestamp after which the reward can no longer be redeemed
    #[serde(default)]
    pub valid_until: Option<i64>,
    #[serde(default)]
    pub stock_quantity: Option<i64>,
}

impl NewReward {
    pub fn validate(&self) -> Result<()> {
        let title = self.title.trim();
        if title.is_empty() || title.len() > MAX_ID_LENGTH {
            return Err(AppError::Validation(
                "Title must be 1-255 characters".to_string(),
            ));
        }

        if self.eco_points_cost <= 0 {
            return Err(AppError::Validation(
                "EcoPoints cost must be positive".to_string(),
            ));
        }

        if !self.value.is_finite() || self.value < 0.0 {
            return Err(AppError::Validation(
                "Value must be a non-negative number".to_string(),
            ));
        }

        if self.stock_quantity.is_some_and(|stock| stock < 0) {
            return Err(AppError::Validation(
                "Stock quantity cannot be negative".to_string(),
            ));
        }

        Ok(())
    }
}

/// Redemption record, created once per successful redemption
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserReward {
    pub id: i64,
    pub user_id: String,
    pub reward_id: i64,
    pub redemption_code: String,
    #[serde(serialize_with = "super::rfc3339")]
    pub redeemed_at: i64,
    #[serde(serialize_with = "super::rfc3339_opt")]
    pub used_at: Option<i64>,
    pub is_used: bool,
    #[serde(serialize_with = "super::rfc3339_opt")]
    pub expires_at: Option<i64>,
}
