//! # Varco (Admin Entry Gate)
//!
//! `varco` is a stateless entry gate in front of an admin surface. It is
//! independent of the primary username/password login: a browser proves
//! knowledge of a shared entry secret at `/admin/enter/{slug}`, receives a
//! one-time 6-digit code by email, and on verification is granted a
//! short-lived gate cookie that authorizes requests under `/admin`.
//!
//! ## State model
//!
//! The server stores nothing. An in-progress challenge lives entirely in a
//! signed, HTTP-only cookie (`admin-otp`) carrying a salted hash of the
//! code plus its expiry; proof of a recent verification lives in a second
//! short-lived cookie (`admin-gate`). Because the challenge cookie holds
//! exactly one token at a time, reissuing a code atomically invalidates
//! the previous one.
//!
//! > **Warning:** Rotating the signing key invalidates every outstanding
//! > challenge and gate token at once. There is no finer-grained
//! > revocation before natural expiry; this is a deliberate consequence of
//! > keeping the flow stateless.

pub mod api;
pub mod cli;
pub mod gate;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
