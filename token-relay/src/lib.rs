//! # Token Relay
//!
//! Small local HTTP service that hands the access token written by the
//! desktop login tool to the browser dashboard.
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `GET /api/token-server/check-token` | current token or `null` |
//! | `POST /api/token-server/create-test-token` | write a token (development) |
//! | `GET /api/token-server/launch-login-tool` | start the desktop login tool |

pub mod config;
pub mod error;
pub mod routes;

pub use config::RelayConfig;
pub use error::{RelayError, Result};
pub use routes::RelayState;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the relay router.
///
/// CORS is fully permissive: the dashboard dev server runs on another port.
pub fn router(config: RelayConfig) -> Router {
    Router::new()
        .route("/api/token-server/check-token", get(routes::check_token))
        .route(
            "/api/token-server/create-test-token",
            post(routes::create_test_token),
        )
        .route(
            "/api/token-server/launch-login-tool",
            get(routes::launch_login_tool),
        )
        .with_state(RelayState::new(config))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until Ctrl+C.
pub async fn serve(config: RelayConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(%addr, token_file = %config.token_file.display(), "Token relay listening");

    axum::serve(listener, router(config))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Token relay shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down");
}
