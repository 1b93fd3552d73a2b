//! HTTP surface: router assembly and server bootstrap.

use anyhow::Result;
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa::OpenApi;

use crate::gate::{authorize, GateState};

pub mod email;
pub mod handlers;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::enter::start,
        handlers::enter::verify,
        handlers::enter::resend,
        handlers::leave::leave,
        handlers::admin::dashboard,
    ),
    tags(
        (name = "gate", description = "Admin entry gate flow"),
        (name = "admin", description = "Guarded admin surface"),
        (name = "health", description = "Service health")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Build the application router.
///
/// The dashboard routes sit behind the authorizer middleware; the entry
/// and leave routes are reachable without evidence, by design.
#[must_use]
pub fn app(state: Arc<GateState>) -> Router {
    let admin = Router::new()
        .route("/", get(handlers::admin::dashboard))
        .route("/dashboard", get(handlers::admin::dashboard))
        .route_layer(middleware::from_fn(authorize::require_admin))
        .route("/enter/:slug", get(handlers::enter::page))
        .route("/enter/:slug/start", post(handlers::enter::start))
        .route("/enter/:slug/verify", post(handlers::enter::verify))
        .route("/enter/:slug/resend", post(handlers::enter::resend))
        .route("/leave", get(handlers::leave::leave));

    Router::new()
        .route("/", get(|| async { "⛩" }))
        .nest("/admin", admin)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(state)),
        )
        .route("/health", get(handlers::health).options(handlers::health))
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, state: Arc<GateState>) -> Result<()> {
    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app(state).into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
