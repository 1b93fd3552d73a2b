//! Entry gate handlers: secret submission, OTP verification, resend, and
//! the minimal entry page.
//!
//! Every validation failure is converted locally into a redirect carrying
//! one of the four error flags (`secret`, `otp`, `expired`, `mail`);
//! nothing propagates as an exception to the client. A missing, malformed,
//! or slug-mismatched challenge token is reported exactly like an expired
//! one, so cookie tampering is indistinguishable from simply waiting too
//! long.

use axum::{
    extract::{Extension, Path, Query},
    http::{header::SET_COOKIE, HeaderMap},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, warn};

use crate::api::email::OtpEmail;
use crate::gate::{
    cookies,
    cookies::{GATE_COOKIE, OTP_COOKIE},
    now_millis, otp,
    otp::{GateToken, OTP_TTL_SECONDS},
    token,
    token::constant_time_eq,
    GateState,
};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct StartForm {
    pub secret: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct VerifyForm {
    pub code: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct EnterQuery {
    pub step: Option<String>,
    pub error: Option<String>,
    pub prompt: Option<String>,
}

fn entry_path(slug: &str) -> String {
    format!("/admin/enter/{slug}")
}

fn sign_in_redirect(state: &GateState) -> Redirect {
    // Unknown slugs are "route not found for this identity", not errors.
    Redirect::to(&format!("{}?admin=1", state.config().sign_in_url()))
}

fn clear_otp_cookie(state: &GateState, headers: &mut HeaderMap) {
    if let Ok(cookie) = cookies::clear(OTP_COOKIE, state.config().secure_cookies()) {
        headers.append(SET_COOKIE, cookie);
    }
}

/// Read and validate the challenge cookie. On any failure the cookie is
/// cleared (when one was present) and the caller redirects with `expired`.
fn active_token(state: &GateState, headers: &HeaderMap) -> Result<GateToken, Response> {
    let Some(raw) = cookies::extract(headers, OTP_COOKIE) else {
        // Missing is reported as expired; no cookie to clear.
        return Err(
            Redirect::to(&format!("{}?error=expired", entry_path(state.config().slug())))
                .into_response(),
        );
    };

    let expired = |state: &GateState| {
        let mut response_headers = HeaderMap::new();
        clear_otp_cookie(state, &mut response_headers);
        (
            response_headers,
            Redirect::to(&format!("{}?error=expired", entry_path(state.config().slug()))),
        )
            .into_response()
    };

    let Some(gate_token) =
        token::decode::<GateToken>(&raw, state.config().signing_key().expose_secret())
    else {
        return Err(expired(state));
    };
    if gate_token.slug != state.config().slug() {
        return Err(expired(state));
    }
    if gate_token.expired(now_millis()) {
        return Err(expired(state));
    }
    Ok(gate_token)
}

/// Issue a fresh challenge and attempt the single email send. Used by
/// both the secret gate and the resend controller.
async fn issue_and_send(state: &GateState, slug: &str, to: &str) -> Response {
    let config = state.config();
    let (code, gate_token) = otp::issue(slug, now_millis());

    let encoded = match token::encode(&gate_token, config.signing_key().expose_secret()) {
        Ok(encoded) => encoded,
        Err(err) => {
            error!("failed to sign challenge token: {err}");
            return Redirect::to(&format!("{}?error=mail", entry_path(slug))).into_response();
        }
    };

    let mut response_headers = HeaderMap::new();
    match cookies::build(OTP_COOKIE, &encoded, OTP_TTL_SECONDS, config.secure_cookies()) {
        Ok(cookie) => {
            response_headers.append(SET_COOKIE, cookie);
        }
        Err(err) => {
            error!("failed to build challenge cookie: {err}");
            return Redirect::to(&format!("{}?error=mail", entry_path(slug))).into_response();
        }
    }

    let message = OtpEmail::entry_code(to, &code);
    if let Err(err) = state.sender().send(&message).await {
        error!("failed to deliver entry code: {err}");
        // Roll back: respond with a clearing cookie instead of the token,
        // returning the browser to a clean awaiting-secret state.
        let mut rollback_headers = HeaderMap::new();
        clear_otp_cookie(state, &mut rollback_headers);
        return (
            rollback_headers,
            Redirect::to(&format!("{}?error=mail", entry_path(slug))),
        )
            .into_response();
    }

    (
        response_headers,
        Redirect::to(&format!("{}?step=otp", entry_path(slug))),
    )
        .into_response()
}

/// Secret-key gate: validate the shared entry secret and issue a code.
#[utoipa::path(
    post,
    path = "/admin/enter/{slug}/start",
    params(("slug" = String, Path, description = "Entry slug")),
    responses(
        (status = 303, description = "Redirect carrying the next step or an error flag")
    ),
    tag = "gate"
)]
pub async fn start(
    Extension(state): Extension<Arc<GateState>>,
    Path(slug): Path<String>,
    Form(form): Form<StartForm>,
) -> impl IntoResponse {
    let config = state.config();
    if slug != config.slug() {
        return sign_in_redirect(&state).into_response();
    }

    if !constant_time_eq(form.secret.trim(), config.entry_secret().expose_secret()) {
        warn!(%slug, "entry secret mismatch");
        return Redirect::to(&format!("{}?error=secret", entry_path(&slug))).into_response();
    }

    let Some(admin_email) = config.admin_email().map(ToString::to_string) else {
        error!("admin notification email is not configured");
        return Redirect::to(&format!("{}?error=mail", entry_path(&slug))).into_response();
    };

    issue_and_send(&state, &slug, &admin_email).await
}

/// OTP verification gate: on a match, trade the challenge cookie for the
/// short-lived gate cookie and enter `/admin`.
#[utoipa::path(
    post,
    path = "/admin/enter/{slug}/verify",
    params(("slug" = String, Path, description = "Entry slug")),
    responses(
        (status = 303, description = "Redirect to /admin on success, or back with an error flag")
    ),
    tag = "gate"
)]
pub async fn verify(
    Extension(state): Extension<Arc<GateState>>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    Form(form): Form<VerifyForm>,
) -> impl IntoResponse {
    let config = state.config();
    if slug != config.slug() {
        return sign_in_redirect(&state).into_response();
    }

    let gate_token = match active_token(&state, &headers) {
        Ok(gate_token) => gate_token,
        Err(response) => return response,
    };

    if !gate_token.matches_code(&form.code) {
        // The challenge cookie is left untouched; the user may retry
        // until the token expires.
        warn!(%slug, "entry code mismatch");
        return Redirect::to(&format!("{}?step=otp&error=otp", entry_path(&slug)))
            .into_response();
    }

    let mut response_headers = HeaderMap::new();
    match cookies::build(
        GATE_COOKIE,
        config.slug(),
        config.gate_ttl_seconds(),
        config.secure_cookies(),
    ) {
        Ok(cookie) => {
            response_headers.append(SET_COOKIE, cookie);
        }
        Err(err) => {
            error!("failed to build gate cookie: {err}");
            return Redirect::to(&format!("{}?error=expired", entry_path(&slug)))
                .into_response();
        }
    }
    clear_otp_cookie(&state, &mut response_headers);

    (response_headers, Redirect::to("/admin")).into_response()
}

/// Resend controller: replace the pending challenge with a fresh one.
///
/// Resend only extends an in-progress challenge; without a valid token it
/// reports `expired` rather than silently bypassing the secret step.
#[utoipa::path(
    post,
    path = "/admin/enter/{slug}/resend",
    params(("slug" = String, Path, description = "Entry slug")),
    responses(
        (status = 303, description = "Redirect back to the OTP step, or with an error flag")
    ),
    tag = "gate"
)]
pub async fn resend(
    Extension(state): Extension<Arc<GateState>>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let config = state.config();
    if slug != config.slug() {
        return sign_in_redirect(&state).into_response();
    }

    if let Err(response) = active_token(&state, &headers) {
        return response;
    }

    let Some(admin_email) = config.admin_email().map(ToString::to_string) else {
        error!("admin notification email is not configured");
        return Redirect::to(&format!("{}?error=mail", entry_path(&slug))).into_response();
    };

    // Full replacement: the previous code stops verifying the instant the
    // new token overwrites the cookie.
    issue_and_send(&state, &slug, &admin_email).await
}

/// Entry page: the awaiting-secret or awaiting-otp form.
///
/// Page layout is intentionally bare; the flow lives in the redirects.
pub async fn page(
    Extension(state): Extension<Arc<GateState>>,
    Path(slug): Path<String>,
    Query(query): Query<EnterQuery>,
    headers: HeaderMap,
) -> Response {
    let config = state.config();
    if slug != config.slug() {
        return sign_in_redirect(&state).into_response();
    }

    // An already-gated browser skips the form unless it asks to see it.
    let gated = cookies::extract(&headers, GATE_COOKIE)
        .is_some_and(|value| constant_time_eq(&value, config.slug()));
    if gated && query.prompt.as_deref() != Some("1") {
        return Redirect::to("/admin").into_response();
    }

    let notice = match query.error.as_deref() {
        Some("secret") => "The entry secret was not accepted.",
        Some("otp") => "That code did not match. Try again.",
        Some("expired") => "Your code expired. Start over with the entry secret.",
        Some("mail") => "The entry code could not be sent. Check the mail configuration.",
        _ => "",
    };

    let path = entry_path(&slug);
    let body = if query.step.as_deref() == Some("otp") {
        format!(
            "<!doctype html><title>Admin entry</title><p>{notice}</p>\
             <form method=\"post\" action=\"{path}/verify\">\
             <label>Entry code <input name=\"code\" autocomplete=\"one-time-code\"></label>\
             <button>Verify</button></form>\
             <form method=\"post\" action=\"{path}/resend\"><button>Resend code</button></form>"
        )
    } else {
        format!(
            "<!doctype html><title>Admin entry</title><p>{notice}</p>\
             <form method=\"post\" action=\"{path}/start\">\
             <label>Entry secret <input name=\"secret\" type=\"password\"></label>\
             <button>Continue</button></form>"
        )
    };

    Html(body).into_response()
}
