//! Route handlers for the gateway.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use linkhub_channels::update::{CallbackQuery, Message, Update};
use linkhub_core::types::Identity;

use crate::server::AppState;

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "linkhub-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

/// Telegram update delivery. The path token must match the configured bot
/// token; well-formed deliveries always get `200` regardless of handler
/// outcome so Telegram does not redeliver.
pub async fn telegram_webhook(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Json(update): Json<Update>,
) -> StatusCode {
    if token != state.bot_token {
        return StatusCode::NOT_FOUND;
    }

    if let Some(message) = update.message {
        handle_message(&state, message).await;
    } else if let Some(query) = update.callback_query {
        handle_callback(&state, query).await;
    }
    StatusCode::OK
}

async fn handle_message(state: &AppState, message: Message) {
    let Some(from) = message.from else { return };
    let Some(text) = message.text else { return };

    let who = Identity::new(from.id, from.username.or(from.first_name));
    let Some(reply) = state.router.handle_text(&who, &text).await else {
        return;
    };

    let chat = message.chat.id.to_string();
    let result = match reply.keyboard {
        Some(keyboard) => {
            state
                .telegram
                .send_message_with_markup(&chat, &reply.text, keyboard.into_markup())
                .await
        }
        None => state.telegram.send_message(&chat, &reply.text).await,
    };
    if let Err(e) = result {
        tracing::warn!("Reply to chat {chat} failed: {e}");
    }
}

async fn handle_callback(state: &AppState, query: CallbackQuery) {
    if let Err(e) = state.telegram.answer_callback_query(&query.id).await {
        tracing::debug!("answerCallbackQuery failed: {e}");
    }

    let topic = state
        .router
        .help_topic(query.data.as_deref().unwrap_or_default())
        .await;

    if let Some(message) = query.message {
        if let Err(e) = state
            .telegram
            .edit_message_text(message.chat.id, message.message_id, &topic)
            .await
        {
            tracing::warn!("editMessageText failed: {e}");
        }
    }
}
