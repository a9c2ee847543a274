use serde::{Deserialize, Serialize};

use crate::constants::{MAX_ID_LENGTH, MAX_TRANSACTION_AMOUNT};
use crate::error::{AppError, Result};

use super::GreenTier;

/// What caused a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum PointsSource {
    Quiz,
    Recycling,
    MarketplacePost,
    RewardRedemption,
    EventAttendance,
    ChallengeCompletion,
    CommunityReport,
    Adjustment,
}

impl PointsSource {
    pub fn as_str(self) -> &'static str {
        match self {
            PointsSource::Quiz => "quiz",
            PointsSource::Recycling => "recycling",
            PointsSource::MarketplacePost => "marketplace_post",
            PointsSource::RewardRedemption => "reward_redemption",
            PointsSource::EventAttendance => "event_attendance",
            PointsSource::ChallengeCompletion => "challenge_completion",
            PointsSource::CommunityReport => "community_report",
            PointsSource::Adjustment => "adjustment",
        }
    }

    /// Check that `amount` moves points in the direction this source allows
    pub fn accepts(self, amount: i64) -> bool {
        match self {
            PointsSource::RewardRedemption => amount < 0,
            PointsSource::Adjustment => amount != 0,
            _ => amount > 0,
        }
    }
}

/// Immutable ledger row
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EcoPointsTransaction {
    pub id: i64,
    pub user_id: String,
    pub amount: i64,
    pub source: PointsSource,
    pub description: String,
    pub reference_id: Option<String>,
    #[serde(serialize_with = "super::rfc3339")]
    pub created_at: i64,
}

/// Input to `Ledger::record_transaction`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub amount: i64,
    pub source: PointsSource,
    pub description: String,
    #[serde(default)]
    pub reference_id: Option<String>,
}

impl NewTransaction {
    pub fn new(amount: i64, source: PointsSource, description: impl Into<String>) -> Self {
        Self {
            amount,
            source,
            description: description.into(),
            reference_id: None,
        }
    }

    pub fn with_reference(mut self, reference_id: impl Into<String>) -> Self {
        self.reference_id = Some(reference_id.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.amount == 0 {
            return Err(AppError::Validation("Amount must be non-zero".to_string()));
        }

        if self.amount.unsigned_abs() > MAX_TRANSACTION_AMOUNT.unsigned_abs() {
            return Err(AppError::Validation(format!(
                "Amount must be at most {} points either way",
                MAX_TRANSACTION_AMOUNT
            )));
        }

        if !self.source.accepts(self.amount) {
            return Err(AppError::Validation(format!(
                "Amount {} does not match the direction of source '{}'",
                self.amount,
                self.source.as_str()
            )));
        }

        let description = self.description.trim();
        if description.is_empty() || description.len() > MAX_ID_LENGTH {
            return Err(AppError::Validation(
                "Description must be 1-255 characters".to_string(),
            ));
        }

        if let Some(reference_id) = &self.reference_id {
            if reference_id.is_empty() || reference_id.len() > MAX_ID_LENGTH {
                return Err(AppError::Validation(
                    "Reference ID must be 1-255 characters".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Balance overview for one user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsSummary {
    pub balance: i64,
    pub green_tier: GreenTier,
    pub lifetime_earned: i64,
    pub lifetime_spent: i64,
    pub transaction_count: i64,
    pub next_tier_at: Option<i64>,
}
