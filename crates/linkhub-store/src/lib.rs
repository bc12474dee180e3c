//! # LinkHub Store
//! The single mutable state object behind the whole service: settings, the
//! FIFO link queue, per-user quota records, and the referral index.
//!
//! All mutation goes through [`Hub`], shared as [`SharedHub`]
//! (`Arc<tokio::sync::Mutex<Hub>>`). Holding the guard for the full
//! read-modify-write unit is the central correctness mechanism — command
//! handlers and the rotation engine serialize on it. Every mutation persists
//! write-through to a JSON snapshot; a failed save is logged and the
//! in-memory state stays authoritative until the next successful write.

pub mod hub;
pub mod quota;
pub mod snapshot;

pub use hub::{Admission, Hub, ReferralCredit, SharedHub};
pub use quota::limit_for_invites;
pub use snapshot::{HubSnapshot, LinkEntry, Settings, UserRecord};
