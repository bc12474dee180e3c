//! Unified error types for LinkHub.

use thiserror::Error;

/// Result type alias using LinkHubError.
pub type Result<T> = std::result::Result<T, LinkHubError>;

#[derive(Error, Debug)]
pub enum LinkHubError {
    // Channel errors (Bot API calls)
    #[error("Channel error: {0}")]
    Channel(String),

    // Store errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Admission refused: the contributor already fills every slot.
    #[error("Slot limit reached ({limit})")]
    QuotaExceeded { limit: u32 },

    /// Removal index outside the contributor's own link list.
    #[error("Invalid link index")]
    InvalidIndex,

    // Command errors
    #[error("Validation error: {0}")]
    Validation(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Gateway errors
    #[error("Gateway error: {0}")]
    Gateway(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LinkHubError {
    pub fn channel(msg: impl Into<String>) -> Self {
        Self::Channel(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
