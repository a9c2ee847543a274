use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::constants::{
    ERR_INVALID_USER_ID, HEADER_SERVICE_KEY, HEADER_SIGNATURE, HEADER_TIMESTAMP, HEADER_USER_ID,
};
use crate::error::AppError;
use crate::models::User;
use crate::routes::validate_signed_request;
use crate::security::service_key_matches;
use crate::AppState;

/// Caller identity proven by a signed `x-user-id` / `x-timestamp` pair
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

/// Trusted server-side caller presenting the configured service key
#[derive(Debug, Clone, Copy)]
pub struct ServiceCaller;

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let user_id = header(parts, HEADER_USER_ID).ok_or(AppError::Unauthorized)?;
        let signature = header(parts, HEADER_SIGNATURE).ok_or(AppError::Unauthorized)?;
        let timestamp: i64 = header(parts, HEADER_TIMESTAMP)
            .ok_or(AppError::Unauthorized)?
            .parse()
            .map_err(|_| AppError::Unauthorized)?;

        if !User::validate_id(user_id) {
            return Err(AppError::Validation(ERR_INVALID_USER_ID.to_string()));
        }

        validate_signed_request(user_id, signature, timestamp, &state.config.app_secret_key)?;

        Ok(AuthUser(user_id.to_string()))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for ServiceCaller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        // Trusted endpoints are disabled unless a service key is configured
        let expected = state
            .config
            .service_secret_key
            .as_deref()
            .ok_or(AppError::Unauthorized)?;

        let presented = header(parts, HEADER_SERVICE_KEY).ok_or(AppError::Unauthorized)?;

        if !service_key_matches(presented, expected) {
            tracing::warn!("Invalid service key attempt");
            return Err(AppError::Unauthorized);
        }

        Ok(ServiceCaller)
    }
}
