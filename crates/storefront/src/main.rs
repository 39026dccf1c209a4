//! Thread and Hanger storefront - boutique site and admin dashboard.
//!
//! This binary serves the shop and the admin dashboard on port 3000.
//!
//! # Architecture
//!
//! - Axum web framework, plain HTML forms (no client-side script)
//! - Askama templates for server-side rendering
//! - External catalog, order, and asset stores (hosted REST, `PostgreSQL`, or memory)
//! - External identity provider for the single admin account
//!
//! # State
//!
//! Products, orders, and images live in the configured stores. The visitor's
//! bag lives in their session, which is persisted in the store database or a
//! local `SQLite` file so it survives restarts.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sentry::integrations::tracing as sentry_tracing;
use thread_hanger_storefront::config::StorefrontConfig;
use thread_hanger_storefront::identity::log_session_events;
use thread_hanger_storefront::state::AppState;
use thread_hanger_storefront::{build_app, init_sentry, sentry_event_filter};

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "thread_hanger_storefront=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    // NOTE: Migrations are NOT run automatically on startup.
    // Run them explicitly via: cargo run -p thread-hanger-cli -- migrate
    let state = AppState::from_config(config.clone())
        .await
        .expect("Failed to initialize application state");

    let _session_log = log_session_events(state.events());
    let _session_cleanup = state.sessions().spawn_expired_deletion();

    let app = build_app(state);

    let addr = config.socket_addr();
    tracing::info!("storefront listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
