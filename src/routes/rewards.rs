use axum::{
    extract::{Path, State},
    Json,
};

use crate::db::rewards;
use crate::error::Result;
use crate::models::{Reward, UserReward};
use crate::routes::auth::AuthUser;
use crate::AppState;

/// GET /api/rewards
pub async fn list_rewards(State(state): State<AppState>) -> Result<Json<Vec<Reward>>> {
    Ok(Json(rewards::list_active_rewards(&state.db).await?))
}

/// POST /api/rewards/:id/redeem
pub async fn redeem_reward(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(reward_id): Path<i64>,
) -> Result<Json<UserReward>> {
    Ok(Json(
        rewards::redeem_reward(&state.db, &user_id, reward_id).await?,
    ))
}

/// GET /api/user/rewards
pub async fn list_user_rewards(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<UserReward>>> {
    Ok(Json(rewards::list_user_rewards(&state.db, &user_id).await?))
}

/// POST /api/user/rewards/:id/use
pub async fn use_reward(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(user_reward_id): Path<i64>,
) -> Result<Json<UserReward>> {
    Ok(Json(
        rewards::use_reward(&state.db, &user_id, user_reward_id).await?,
    ))
}
