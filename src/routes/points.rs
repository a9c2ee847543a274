use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::ledger;
use crate::error::{AppError, Result};
use crate::models::{EcoPointsTransaction, NewTransaction, PointsSource, PointsSummary, User};
use crate::routes::auth::{AuthUser, ServiceCaller};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    pub limit: Option<i64>,
    /// Only return transactions older than this transaction id
    pub before: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AwardResponse {
    pub transaction: EcoPointsTransaction,
    pub user: User,
}

/// GET /api/eco-points/transactions?limit=N&before=ID
pub async fn list_transactions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<TransactionsQuery>,
) -> Result<Json<Vec<EcoPointsTransaction>>> {
    let limit = params
        .limit
        .unwrap_or(state.config.default_transaction_limit);

    let transactions =
        ledger::list_transactions(&state.db, &user_id, Some(limit), params.before).await?;

    Ok(Json(transactions))
}

/// GET /api/eco-points/summary
pub async fn points_summary(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PointsSummary>> {
    Ok(Json(ledger::summary(&state.db, &user_id).await?))
}

/// Award (or adjust) points for the signed-in user
///
/// Only trusted server-side callers holding the service key may reach this;
/// end users earn points through the actions that call it. Redemptions must
/// go through the reward endpoint.
///
/// POST /api/eco-points/award
pub async fn award_points(
    State(state): State<AppState>,
    _service: ServiceCaller,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<NewTransaction>,
) -> Result<Json<AwardResponse>> {
    if payload.source == PointsSource::RewardRedemption {
        return Err(AppError::Validation(
            "Redemptions must use the reward redemption endpoint".to_string(),
        ));
    }

    let (transaction, user) = ledger::record_award(&state.db, &user_id, &payload).await?;

    Ok(Json(AwardResponse { transaction, user }))
}
