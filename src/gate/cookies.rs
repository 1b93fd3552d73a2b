//! Set-Cookie construction and Cookie-header extraction for the gate.

use axum::http::{header::InvalidHeaderValue, HeaderMap, HeaderValue};

/// Holds the signed, pending OTP challenge.
pub const OTP_COOKIE: &str = "admin-otp";

/// Holds the expected slug after a successful verification.
pub const GATE_COOKIE: &str = "admin-gate";

/// Build a secure `HttpOnly` cookie for a gate value.
///
/// # Errors
/// Returns an error if the value cannot be represented as a header.
pub fn build(
    name: &str,
    value: &str,
    max_age_seconds: i64,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie =
        format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_seconds}");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Build the clearing variant of a gate cookie.
///
/// # Errors
/// Returns an error if the name cannot be represented as a header.
pub fn clear(name: &str, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Extract a cookie value by name from the request headers.
#[must_use]
pub fn extract(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(axum::http::header::COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        // Pairs without '=' are skipped rather than aborting the scan.
        let Some((key, val)) = pair.trim().split_once('=') else {
            continue;
        };
        if key.trim() == name {
            return Some(val.trim().to_string());
        }
    }
    None
}
