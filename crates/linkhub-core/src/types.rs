//! Shared types carried across crate boundaries.

use serde::{Deserialize, Serialize};

/// Telegram user identifier.
pub type UserId = i64;

/// Who sent an inbound event. The display name is whatever the platform
/// reported on this interaction and may differ from what is stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub username: Option<String>,
}

impl Identity {
    pub fn new(id: UserId, username: Option<String>) -> Self {
        Self { id, username }
    }

    /// Display form for user-facing text: `@name` or the raw id.
    pub fn display(&self) -> String {
        match &self.username {
            Some(name) if !name.is_empty() => format!("@{name}"),
            _ => self.id.to_string(),
        }
    }
}
