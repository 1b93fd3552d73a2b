//! The guarded admin surface.
//!
//! The real dashboard lives elsewhere; this service only decides who may
//! reach it. The placeholder below is what the gate protects.

use axum::response::{IntoResponse, Json};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/admin",
    responses(
        (status = 200, description = "Admin surface reachable"),
        (status = 303, description = "No admin evidence, redirected to sign-in")
    ),
    tag = "admin"
)]
pub async fn dashboard() -> impl IntoResponse {
    Json(json!({
        "area": "admin",
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
