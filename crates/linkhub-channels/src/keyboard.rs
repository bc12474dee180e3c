//! Inline keyboard builder.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

/// Rows of callback buttons, serialized as Telegram `reply_markup`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InlineKeyboard {
    inline_keyboard: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single-button row.
    pub fn row(mut self, text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        self.inline_keyboard.push(vec![InlineButton {
            text: text.into(),
            callback_data: callback_data.into(),
        }]);
        self
    }

    pub fn into_markup(self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({"inline_keyboard": []}))
    }
}
