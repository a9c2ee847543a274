use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::db::{rewards, users};
use crate::error::Result;
use crate::models::{AuditReport, NewReward, Reward};
use crate::routes::auth::ServiceCaller;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    #[serde(rename = "isActive")]
    pub is_active: bool,
}

/// Add a reward to the catalog
///
/// POST /api/admin/rewards
pub async fn create_reward(
    State(state): State<AppState>,
    _service: ServiceCaller,
    Json(payload): Json<NewReward>,
) -> Result<Json<Reward>> {
    Ok(Json(rewards::create_reward(&state.db, &payload).await?))
}

/// Enable or disable a reward; disabled rewards cannot be redeemed
///
/// POST /api/admin/rewards/:id/active
pub async fn set_reward_active(
    State(state): State<AppState>,
    _service: ServiceCaller,
    Path(reward_id): Path<i64>,
    Json(payload): Json<SetActiveRequest>,
) -> Result<Json<Reward>> {
    Ok(Json(
        rewards::set_reward_active(&state.db, reward_id, payload.is_active).await?,
    ))
}

/// Ledger audit: record counts and every user whose balance has drifted
/// from the sum of their transactions
///
/// GET /api/admin/audit
pub async fn audit_ledger(
    State(state): State<AppState>,
    _service: ServiceCaller,
) -> Result<Json<AuditReport>> {
    let report = users::audit(&state.db).await?;

    tracing::info!(
        "Ledger audit requested: {} users, {} transactions, {} redemptions, {} drifted",
        report.user_count,
        report.transaction_count,
        report.redemption_count,
        report.drift.len()
    );

    Ok(Json(report))
}
