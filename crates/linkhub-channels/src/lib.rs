//! # LinkHub Channels
//! Telegram Bot API plumbing: the REST client (the `Messenger`
//! implementation), webhook update payload types, and inline keyboards.

pub mod keyboard;
pub mod telegram;
pub mod update;

pub use keyboard::InlineKeyboard;
pub use telegram::{TelegramChannel, TelegramUser};
pub use update::{CallbackQuery, Chat, Message, Update, User};
