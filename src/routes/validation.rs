use chrono::{DateTime, Utc};

use crate::constants::{ERR_INVALID_TIMESTAMP, MAX_TIMESTAMP_AGE_SECS};
use crate::error::AppError;
use crate::security::{signed_identity, validate_timestamp, verify_hmac};

/// Convert Unix timestamp to RFC3339 string, defaulting to now if invalid
pub fn timestamp_to_rfc3339(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .unwrap_or_else(Utc::now)
        .to_rfc3339()
}

/// Error type for signed request validation (constrained to only possible errors)
#[derive(Debug, PartialEq, Eq)]
pub enum SignedRequestError {
    InvalidSignature,
    InvalidTimestamp,
}

impl From<SignedRequestError> for AppError {
    fn from(err: SignedRequestError) -> Self {
        match err {
            SignedRequestError::InvalidSignature => AppError::InvalidSignature,
            SignedRequestError::InvalidTimestamp => {
                AppError::Validation(ERR_INVALID_TIMESTAMP.to_string())
            }
        }
    }
}

/// Verify that `user_id` signed `timestamp` with the shared secret, recently
pub fn validate_signed_request(
    user_id: &str,
    signature: &str,
    timestamp: i64,
    secret: &str,
) -> Result<(), SignedRequestError> {
    if !verify_hmac(&signed_identity(user_id, timestamp), signature, secret) {
        tracing::warn!("Invalid HMAC signature for user {}", user_id);
        return Err(SignedRequestError::InvalidSignature);
    }

    if !validate_timestamp(timestamp, MAX_TIMESTAMP_AGE_SECS) {
        return Err(SignedRequestError::InvalidTimestamp);
    }

    Ok(())
}
