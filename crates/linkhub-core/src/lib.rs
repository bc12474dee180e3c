//! # LinkHub Core
//! Error type, configuration, shared types, and collaborator traits.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::HubConfig;
pub use error::{LinkHubError, Result};
pub use traits::Messenger;
pub use types::Identity;
