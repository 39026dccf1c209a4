//! Thread and Hanger storefront library.
//!
//! The boutique site and its admin dashboard, built as a library so the
//! binary, the CLI, and the integration tests share one router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod bag;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod filters;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;

use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::from_fn,
    routing::get,
};
use sentry::integrations::tracing as sentry_tracing;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::config::StorefrontConfig;
use crate::middleware::{
    SessionBackend, create_session_layer, request_context_middleware,
    security_headers_middleware,
};
use crate::state::AppState;

/// Directory holding the stylesheet and other static assets.
const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Build the full application router with every layer applied.
///
/// Sessions are kept in `PostgreSQL` when the backend has a pool and in a
/// `SQLite` file otherwise. Serve it with
/// `into_make_service_with_connect_info::<SocketAddr>()` so the login rate
/// limiter can fall back to the peer address.
pub fn build_app(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR));

    if let Some(upload_dir) = &state.backends().upload_dir {
        router = router.nest_service("/uploads", ServeDir::new(upload_dir));
    }

    let router = router.layer(from_fn(request_context_middleware));
    let router = match state.sessions().clone() {
        SessionBackend::Postgres(store) => {
            router.layer(create_session_layer(store, state.config()))
        }
        SessionBackend::Sqlite(store) => {
            router.layer(create_session_layer(store, state.config()))
        }
    };

    router
        .layer(from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
#[must_use]
pub fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
#[must_use]
pub fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the catalog store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.backends().catalog.ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
