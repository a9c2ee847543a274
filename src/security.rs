use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// Request Signatures
// =============================================================================

/// Payload a client signs to prove who it is: `"{user_id}:{timestamp}"`
pub fn signed_identity(user_id: &str, timestamp: i64) -> String {
    format!("{}:{}", user_id, timestamp)
}

/// Produce the hex-encoded HMAC-SHA256 signature of `data`
pub fn sign(data: &str, secret: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(data.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Verify HMAC-SHA256 signature
///
/// # Arguments
/// * `data` - The data that was signed
/// * `signature` - The hex-encoded HMAC signature
/// * `secret` - The shared secret key (from environment)
pub fn verify_hmac(data: &str, signature: &str, secret: &str) -> bool {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            tracing::error!("Failed to create HMAC instance");
            return false;
        }
    };

    mac.update(data.as_bytes());

    let sig_bytes = match hex::decode(signature) {
        Ok(bytes) => bytes,
        Err(_) => {
            tracing::warn!("Invalid hex signature format");
            return false;
        }
    };

    mac.verify_slice(&sig_bytes).is_ok()
}

/// Validate timestamp is within acceptable range
///
/// Prevents replay attacks by ensuring the request is recent.
pub fn validate_timestamp(timestamp: i64, max_age_secs: i64) -> bool {
    let now = chrono::Utc::now().timestamp();
    let age_seconds = now.abs_diff(timestamp);

    if age_seconds > max_age_secs.unsigned_abs() {
        tracing::warn!(
            "Timestamp too old: {} seconds (max: {})",
            age_seconds,
            max_age_secs
        );
        return false;
    }

    true
}

/// Compare a presented service key against the configured one.
///
/// Both sides are hashed first so the comparison time does not depend on
/// how long a matching prefix is.
pub fn service_key_matches(presented: &str, expected: &str) -> bool {
    Sha256::digest(presented.as_bytes()) == Sha256::digest(expected.as_bytes())
}

// =============================================================================
// Redemption Codes
// =============================================================================

/// Crockford base32 alphabet (no I, L, O, U)
const CODE_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Random bytes per code: 10 bytes = 80 bits = 16 base32 characters
const CODE_BYTES: usize = 10;

/// Generate a redemption code of the form `ECO-XXXX-XXXX-XXXX-XXXX`
///
/// The 80 random bits come from the operating system RNG, so codes are not
/// predictable from earlier ones. Uniqueness across rows is still enforced by
/// the database.
pub fn generate_redemption_code() -> String {
    let mut bytes = [0u8; CODE_BYTES];
    OsRng.fill_bytes(&mut bytes);
    format_code(&bytes)
}

fn format_code(bytes: &[u8; CODE_BYTES]) -> String {
    let mut symbols = String::with_capacity(CODE_BYTES * 8 / 5);
    let mut buffer: u32 = 0;
    let mut bits = 0;

    for &byte in bytes {
        buffer = (buffer << 8) | byte as u32;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            let index = (buffer >> bits) & 0x1f;
            symbols.push(CODE_ALPHABET[index as usize] as char);
        }
        buffer &= (1 << bits) - 1;
    }

    let groups: Vec<&str> = (0..symbols.len())
        .step_by(4)
        .map(|start| &symbols[start..start + 4])
        .collect();

    format!("ECO-{}", groups.join("-"))
}
