//! Signed token codec for cookie-resident state.
//!
//! A token is `base64url(hex_hmac_sha256(key, json) + "." + json)`. The
//! signature covers the exact JSON bytes, so `decode` only yields a value
//! when the payload is byte-for-byte what was signed with the same key.
//! This is integrity-only: the holder of the cookie can read the payload,
//! which is fine because the payload never contains the raw code.

use anyhow::{Context, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use serde::{de::DeserializeOwned, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SEPARATOR: char = '.';

/// Serialize and sign a payload into a cookie-safe string.
///
/// # Errors
/// Returns an error if the payload cannot be serialized or the key is
/// rejected by the MAC.
pub fn encode<T: Serialize>(payload: &T, key: &str) -> Result<String> {
    let json = serde_json::to_string(payload).context("failed to serialize token payload")?;
    let signature = sign(key, &json)?;
    let bundle = format!("{signature}{SEPARATOR}{json}");
    Ok(Base64UrlUnpadded::encode_string(bundle.as_bytes()))
}

/// Verify and deserialize a token produced by [`encode`].
///
/// Any malformation (bad base64, missing separator, invalid UTF-8,
/// non-JSON payload) and any signature mismatch yields `None`. Callers
/// must not be able to distinguish a tampered token from an absent one.
pub fn decode<T: DeserializeOwned>(token: &str, key: &str) -> Option<T> {
    let bundle = Base64UrlUnpadded::decode_vec(token).ok()?;
    let bundle = String::from_utf8(bundle).ok()?;
    let (signature, json) = bundle.split_once(SEPARATOR)?;
    let expected = sign(key, json).ok()?;
    if !constant_time_eq(signature, &expected) {
        return None;
    }
    serde_json::from_str(json).ok()
}

fn sign(key: &str, data: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|err| anyhow::anyhow!("invalid HMAC key: {err}"))?;
    mac.update(data.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time string comparison.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (byte_a, byte_b) in a.bytes().zip(b.bytes()) {
        result |= byte_a ^ byte_b;
    }
    result == 0
}
