//! Gateway server setup.

use std::sync::Arc;
use std::time::Instant;

use axum::routing::{get, post};
use axum::Router;
use linkhub_channels::TelegramChannel;
use linkhub_commands::CommandRouter;
use linkhub_core::error::{LinkHubError, Result};
use tower_http::trace::TraceLayer;

use crate::routes;

/// Shared handles for the route handlers.
pub struct AppState {
    pub router: CommandRouter,
    pub telegram: Arc<TelegramChannel>,
    /// Webhook path secret — Telegram proves itself by knowing the token.
    pub bot_token: String,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(router: CommandRouter, telegram: Arc<TelegramChannel>, bot_token: String) -> Self {
        Self { router, telegram, bot_token, start_time: Instant::now() }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health_check))
        .route("/webhook/{token}", post(routes::telegram_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process exits.
pub async fn serve(state: Arc<AppState>, host: &str, port: u16) -> Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| LinkHubError::Gateway(format!("Bind {addr}: {e}")))?;
    tracing::info!("Gateway listening on {addr}");
    axum::serve(listener, app(state))
        .await
        .map_err(|e| LinkHubError::Gateway(format!("Serve: {e}")))
}
