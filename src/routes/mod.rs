pub mod admin;
pub mod auth;
pub mod health;
pub mod points;
pub mod register;
pub mod rewards;
pub mod validation;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub use admin::{audit_ledger, create_reward, set_reward_active};
pub use auth::{AuthUser, ServiceCaller};
pub use health::health_check;
pub use points::{award_points, list_transactions, points_summary};
pub use register::register_user;
pub use rewards::{list_rewards, list_user_rewards, redeem_reward, use_reward};
pub use validation::{timestamp_to_rfc3339, validate_signed_request};

/// Build the application router (without transport layers such as CORS)
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/register", post(register_user))
        .route("/api/eco-points/transactions", get(list_transactions))
        .route("/api/eco-points/summary", get(points_summary))
        .route("/api/eco-points/award", post(award_points))
        .route("/api/rewards", get(list_rewards))
        .route("/api/rewards/:id/redeem", post(redeem_reward))
        .route("/api/user/rewards", get(list_user_rewards))
        .route("/api/user/rewards/:id/use", post(use_reward))
        .route("/api/admin/rewards", post(create_reward))
        .route("/api/admin/rewards/:id/active", post(set_reward_active))
        .route("/api/admin/audit", get(audit_ledger))
        .with_state(state)
}
