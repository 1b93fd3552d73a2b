//! Leave route: drop both gate cookies and return to sign-in.

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap},
    response::{IntoResponse, Redirect},
};
use std::sync::Arc;

use crate::gate::{
    cookies,
    cookies::{GATE_COOKIE, OTP_COOKIE},
    GateState,
};

/// Clear both cookies and redirect to the primary sign-in page.
/// Idempotent: leaving twice is the same as leaving once.
#[utoipa::path(
    get,
    path = "/admin/leave",
    responses(
        (status = 303, description = "Cookies cleared, redirect to sign-in")
    ),
    tag = "gate"
)]
pub async fn leave(Extension(state): Extension<Arc<GateState>>) -> impl IntoResponse {
    let secure = state.config().secure_cookies();
    let mut headers = HeaderMap::new();
    for name in [OTP_COOKIE, GATE_COOKIE] {
        if let Ok(cookie) = cookies::clear(name, secure) {
            headers.append(SET_COOKIE, cookie);
        }
    }
    (
        headers,
        Redirect::to(&format!("{}?admin=1", state.config().sign_in_url())),
    )
}
