//! Admin session authorizer.
//!
//! A pure predicate over the request headers, evaluated on every request
//! under `/admin` except the entry and leave routes. Two independent
//! evidence strategies are checked in sequence:
//!
//! 1. the short-lived `admin-gate` cookie set by a successful OTP
//!    verification, and
//! 2. an elevated-role claim minted by the primary auth system, carried
//!    in its own signed `session` cookie and verified with a separate key.
//!
//! The strategies share nothing; either can be removed or swapped without
//! touching the other.

use axum::{
    extract::{Extension, Request},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use super::{cookies, now_millis, token, token::constant_time_eq, GateState};

/// Cookie set by the primary auth system; external to this crate.
const PRIMARY_SESSION_COOKIE: &str = "session";
const ADMIN_ROLE: &str = "admin";

/// One way of proving that a request may enter the admin surface.
pub trait AdminEvidence: Send + Sync {
    fn name(&self) -> &'static str;
    fn granted(&self, headers: &HeaderMap) -> bool;
}

/// Evidence: the `admin-gate` cookie equals the configured slug.
pub struct GateCookieEvidence {
    slug: String,
}

impl GateCookieEvidence {
    #[must_use]
    pub fn new(slug: String) -> Self {
        Self { slug }
    }
}

impl AdminEvidence for GateCookieEvidence {
    fn name(&self) -> &'static str {
        "gate-cookie"
    }

    fn granted(&self, headers: &HeaderMap) -> bool {
        cookies::extract(headers, cookies::GATE_COOKIE)
            .is_some_and(|value| constant_time_eq(&value, &self.slug))
    }
}

/// Claims carried in the primary auth system's signed session cookie.
#[derive(Debug, Deserialize)]
struct SessionClaims {
    role: String,
    /// Expiry as epoch milliseconds; absent means non-expiring.
    exp: Option<i64>,
}

/// Evidence: the primary session cookie claims an elevated role.
///
/// Without a configured verification key this strategy never grants.
pub struct RoleClaimEvidence {
    session_secret: Option<SecretString>,
}

impl RoleClaimEvidence {
    #[must_use]
    pub fn new(session_secret: Option<SecretString>) -> Self {
        Self { session_secret }
    }
}

impl AdminEvidence for RoleClaimEvidence {
    fn name(&self) -> &'static str {
        "role-claim"
    }

    fn granted(&self, headers: &HeaderMap) -> bool {
        let Some(secret) = self.session_secret.as_ref() else {
            return false;
        };
        let Some(raw) = cookies::extract(headers, PRIMARY_SESSION_COOKIE) else {
            return false;
        };
        let Some(claims) = token::decode::<SessionClaims>(&raw, secret.expose_secret()) else {
            return false;
        };
        if claims.role != ADMIN_ROLE {
            return false;
        }
        match claims.exp {
            Some(exp) => now_millis() <= exp,
            None => true,
        }
    }
}

/// Evaluates evidence strategies in sequence; grants on the first match.
pub struct Authorizer {
    strategies: Vec<Box<dyn AdminEvidence>>,
}

impl Authorizer {
    #[must_use]
    pub fn new(strategies: Vec<Box<dyn AdminEvidence>>) -> Self {
        Self { strategies }
    }

    #[must_use]
    pub fn for_config(config: &super::GateConfig) -> Self {
        Self::new(vec![
            Box::new(GateCookieEvidence::new(config.slug().to_string())),
            Box::new(RoleClaimEvidence::new(config.session_secret().cloned())),
        ])
    }

    #[must_use]
    pub fn grants(&self, headers: &HeaderMap) -> bool {
        for strategy in &self.strategies {
            if strategy.granted(headers) {
                debug!(evidence = strategy.name(), "admin access granted");
                return true;
            }
        }
        false
    }
}

/// Middleware guarding the admin surface.
///
/// No side effects and no state transition of its own: unauthorized
/// requests are redirected to the primary sign-in page with an
/// admin-context flag.
pub async fn require_admin(
    Extension(state): Extension<Arc<GateState>>,
    request: Request,
    next: Next,
) -> Response {
    if state.authorizer().grants(request.headers()) {
        return next.run(request).await;
    }
    debug!("no admin evidence presented, redirecting to sign-in");
    Redirect::to(&format!("{}?admin=1", state.config().sign_in_url())).into_response()
}
