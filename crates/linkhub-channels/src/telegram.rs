//! Telegram Bot channel — REST API over HTTPS.
//!
//! Updates arrive through the webhook gateway; this client only sends.
//! Every helper maps transport and API-level failures into
//! `LinkHubError::Channel` so callers can decide whether delivery is
//! best-effort or not.

use std::path::Path;

use async_trait::async_trait;
use linkhub_core::error::{LinkHubError, Result};
use linkhub_core::traits::Messenger;
use linkhub_core::types::UserId;
use serde::{Deserialize, Serialize};

const API_BASE: &str = "https://api.telegram.org";

/// Telegram Bot API client.
pub struct TelegramChannel {
    bot_token: String,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            client: reqwest::Client::new(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{API_BASE}/bot{}/{method}", self.bot_token)
    }

    /// POST a JSON body and unwrap Telegram's `{ok, result, description}`
    /// envelope.
    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(&body)
            .send()
            .await
            .map_err(|e| LinkHubError::Channel(format!("Telegram {method} failed: {e}")))?;

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| LinkHubError::Channel(format!("Invalid {method} response: {e}")))?;

        if !envelope.ok {
            let why = envelope.description.unwrap_or_else(|| "unknown error".into());
            return Err(LinkHubError::Channel(format!("Telegram {method}: {why}")));
        }
        envelope
            .result
            .ok_or_else(|| LinkHubError::Channel(format!("Telegram {method}: empty result")))
    }

    /// Send plain text to a chat (numeric id or `@username`).
    pub async fn send_message(&self, chat: &str, text: &str) -> Result<()> {
        let body = serde_json::json!({ "chat_id": chat_id_value(chat), "text": text });
        let _: serde_json::Value = self.call("sendMessage", body).await?;
        Ok(())
    }

    /// Send text with an inline keyboard attached.
    pub async fn send_message_with_markup(
        &self,
        chat: &str,
        text: &str,
        reply_markup: serde_json::Value,
    ) -> Result<()> {
        let body = serde_json::json!({
            "chat_id": chat_id_value(chat),
            "text": text,
            "reply_markup": reply_markup,
        });
        let _: serde_json::Value = self.call("sendMessage", body).await?;
        Ok(())
    }

    /// Replace the text of an existing message (help topic navigation).
    pub async fn edit_message_text(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
        });
        let _: serde_json::Value = self.call("editMessageText", body).await?;
        Ok(())
    }

    /// Acknowledge a callback query so the client stops the spinner.
    pub async fn answer_callback_query(&self, callback_id: &str) -> Result<()> {
        let body = serde_json::json!({ "callback_query_id": callback_id });
        let _: serde_json::Value = self.call("answerCallbackQuery", body).await?;
        Ok(())
    }

    /// Current bot info.
    pub async fn get_me(&self) -> Result<TelegramUser> {
        self.call("getMe", serde_json::json!({})).await
    }

    /// Upload a local file to a chat as a document.
    pub async fn send_document_to(&self, chat: &str, path: &Path) -> Result<()> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| LinkHubError::Channel(format!("Read document: {e}")))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".into());

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new()
            .text("chat_id", chat.to_string())
            .part("document", part);

        let response = self
            .client
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| LinkHubError::Channel(format!("Telegram sendDocument failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(LinkHubError::Channel(format!("Telegram sendDocument {status}: {text}")));
        }
        Ok(())
    }
}

/// Numeric targets go out as JSON numbers, `@username` targets as strings.
fn chat_id_value(chat: &str) -> serde_json::Value {
    match chat.parse::<i64>() {
        Ok(id) => serde_json::Value::from(id),
        Err(_) => serde_json::Value::from(chat),
    }
}

#[async_trait]
impl Messenger for TelegramChannel {
    async fn publish(&self, target: &str, text: &str) -> Result<()> {
        self.send_message(target, text).await
    }

    async fn notify(&self, user: UserId, text: &str) -> Result<()> {
        self.send_message(&user.to_string(), text).await
    }

    async fn send_document(&self, user: UserId, path: &Path) -> Result<()> {
        self.send_document_to(&user.to_string(), path).await
    }

    async fn bot_username(&self) -> Result<String> {
        let me = self.get_me().await?;
        me.username
            .filter(|u| !u.is_empty())
            .ok_or_else(|| LinkHubError::Channel("Bot has no username".into()))
    }
}

// --- Telegram API Types ---

#[derive(Debug, Clone, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub is_bot: Option<bool>,
}
