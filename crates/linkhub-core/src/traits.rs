//! Collaborator seams.
//!
//! The rotation engine, backup scheduler, and command router talk to the
//! messaging platform through `Messenger` only, so tests can swap in a
//! recording mock and the Bot API client stays in one crate.

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::UserId;

/// Outbound messaging surface.
///
/// `publish` targets the rotation chat (numeric id or `@username`);
/// `notify` targets a single user's private chat. Callers that only need
/// best-effort delivery are expected to log and swallow the error.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Post `text` into a chat addressed by id or `@username`.
    async fn publish(&self, target: &str, text: &str) -> Result<()>;

    /// Direct-message a user.
    async fn notify(&self, user: UserId, text: &str) -> Result<()>;

    /// Send a file to a user's private chat.
    async fn send_document(&self, user: UserId, path: &Path) -> Result<()>;

    /// The bot's own username, used for referral links and contact text.
    async fn bot_username(&self) -> Result<String>;
}
