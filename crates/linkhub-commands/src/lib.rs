//! # LinkHub Commands
//! The command surface: text → `Command`, and the router that mutates the
//! store and produces replies. Admin commands are silently dropped for
//! anyone but the configured owner.

pub mod command;
pub mod router;
pub mod text;

pub use command::Command;
pub use router::{CommandRouter, Reply};
