//! One-time code generation and the cookie-resident challenge record.
//!
//! The cookie stores a salted hash of the code, never the code itself, so
//! reading the cookie (devtools, logs) does not disclose the live code
//! while still allowing stateless verification.

use rand::{rngs::OsRng, Rng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::token::constant_time_eq;

/// Challenge lifetime: 5 minutes from issuance.
pub const OTP_TTL_SECONDS: i64 = 5 * 60;

/// A pending OTP challenge, carried inside the signed `admin-otp` cookie.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GateToken {
    pub slug: String,
    pub hash: String,
    pub salt: String,
    /// Expiry as epoch milliseconds.
    pub exp: i64,
}

impl GateToken {
    #[must_use]
    pub fn expired(&self, now_millis: i64) -> bool {
        now_millis > self.exp
    }

    /// Recompute the salted hash for a submitted code and compare it to
    /// the stored digest in constant time.
    #[must_use]
    pub fn matches_code(&self, code: &str) -> bool {
        constant_time_eq(&salted_hash(code.trim(), &self.salt), &self.hash)
    }
}

/// Draw a zero-padded 6-digit code uniformly from 000000-999999.
#[must_use]
pub fn generate_code() -> String {
    format!("{:06}", OsRng.gen_range(0..1_000_000u32))
}

/// Fresh random 8-byte salt, hex encoded, one per issuance.
#[must_use]
pub fn generate_salt() -> String {
    let mut bytes = [0u8; 8];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hex SHA-256 over `code:salt`.
#[must_use]
pub fn salted_hash(code: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{code}:{salt}").as_bytes());
    hex::encode(hasher.finalize())
}

/// Issue a new challenge: the raw code goes out by email, the token goes
/// into the signed cookie.
#[must_use]
pub fn issue(slug: &str, now_millis: i64) -> (String, GateToken) {
    let code = generate_code();
    let salt = generate_salt();
    let hash = salted_hash(&code, &salt);
    let token = GateToken {
        slug: slug.to_string(),
        hash,
        salt,
        exp: now_millis + OTP_TTL_SECONDS * 1000,
    };
    (code, token)
}
