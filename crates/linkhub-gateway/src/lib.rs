//! # LinkHub Gateway
//! axum front-end delivering Telegram webhook updates to the command
//! router. Pure I/O plumbing — no state of its own beyond the shared
//! handles it carries.

pub mod routes;
pub mod server;

pub use server::{serve, AppState};
