pub mod audit;
pub mod reward;
pub mod transaction;
pub mod user;

pub use audit::{AuditReport, DriftEntry};
pub use reward::{NewReward, Reward, RewardType, UserReward};
pub use transaction::{EcoPointsTransaction, NewTransaction, PointsSource, PointsSummary};
pub use user::{GreenTier, User};

use serde::Serializer;

use crate::routes::timestamp_to_rfc3339;

/// Serialize a stored Unix timestamp as an RFC 3339 string
pub(crate) fn rfc3339<S: Serializer>(timestamp: &i64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&timestamp_to_rfc3339(*timestamp))
}

/// Serialize an optional Unix timestamp as an RFC 3339 string or null
pub(crate) fn rfc3339_opt<S: Serializer>(
    timestamp: &Option<i64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match timestamp {
        Some(ts) => serializer.serialize_str(&timestamp_to_rfc3339(*ts)),
        None => serializer.serialize_none(),
    }
}
