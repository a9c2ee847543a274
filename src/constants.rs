/// Maximum age of a signed request timestamp in seconds (5 minutes)
/// Prevents replay attacks
pub const MAX_TIMESTAMP_AGE_SECS: i64 = 300;

/// Transactions returned when the caller gives no limit
pub const DEFAULT_TRANSACTION_LIMIT: i64 = 50;

/// Upper bound on a single page of transaction history
pub const MAX_TRANSACTION_LIMIT: i64 = 200;

/// Attempts at inserting a redemption with a fresh code before giving up
pub const REDEMPTION_CODE_ATTEMPTS: usize = 5;

/// Largest number of points a single transaction may move either way
pub const MAX_TRANSACTION_AMOUNT: i64 = 1_000_000_000;

/// Maximum length of user ids, usernames and descriptions
pub const MAX_ID_LENGTH: usize = 255;

// =============================================================================
// Green Tier thresholds (lifetime earned points)
// =============================================================================

pub const SILVER_TIER_POINTS: i64 = 500;
pub const GOLD_TIER_POINTS: i64 = 1500;
pub const PLATINUM_TIER_POINTS: i64 = 3000;

// =============================================================================
// Request headers
// =============================================================================

pub const HEADER_USER_ID: &str = "x-user-id";
pub const HEADER_TIMESTAMP: &str = "x-timestamp";
pub const HEADER_SIGNATURE: &str = "x-signature";
pub const HEADER_SERVICE_KEY: &str = "x-service-key";

// =============================================================================
// Error Messages
// =============================================================================

/// Error message for invalid user ID format
pub const ERR_INVALID_USER_ID: &str = "Invalid user ID format";

/// Error message for timestamp validation failure
pub const ERR_INVALID_TIMESTAMP: &str = "Timestamp too old or in the future";
