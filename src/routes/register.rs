use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::constants::ERR_INVALID_USER_ID;
use crate::db::users;
use crate::error::{AppError, Result};
use crate::models::User;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub user: User,
}

/// Register a new user
///
/// Creates a user with a zero EcoPoints balance and the Bronze tier.
/// Returns 409 Conflict if the user ID or username is taken.
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>> {
    if !User::validate_id(&payload.user_id) {
        tracing::warn!("Invalid user ID format: {}", payload.user_id);
        return Err(AppError::Validation(ERR_INVALID_USER_ID.to_string()));
    }

    if !User::validate_username(&payload.username) {
        return Err(AppError::Validation(
            "Username must be 3-255 printable characters".to_string(),
        ));
    }

    let user = users::create_user(&state.db, &payload.user_id, &payload.username).await?;

    Ok(Json(RegisterResponse {
        success: true,
        user,
    }))
}
