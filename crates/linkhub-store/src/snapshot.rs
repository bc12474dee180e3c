//! Durable snapshot schema.
//!
//! One JSON document holds the full state — no partial or incremental
//! format. Field names match the historical on-disk layout so existing
//! `data.json` files keep loading.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use linkhub_core::types::UserId;
use serde::{Deserialize, Serialize};

/// Singleton rotation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Target chat: numeric id or `@username`. Rotation may only run while set.
    #[serde(default)]
    pub chat_id: Option<String>,
    /// Rotation interval, minutes. Always positive.
    pub interval: u32,
    #[serde(default)]
    pub running: bool,
    /// Last published link, retained for re-display on exhaustion.
    #[serde(default)]
    pub last_link: Option<String>,
    /// Legacy cursor. Reset to 0 on every pop, never consulted for timing.
    #[serde(default)]
    pub rotation_index: u32,
}

/// One queued link. Immutable after creation; destroyed by pop or removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkEntry {
    pub link: String,
    pub owner_id: UserId,
    /// Display name snapshot at insertion time; may go stale.
    #[serde(default)]
    pub owner_username: String,
    pub added_at: DateTime<Utc>,
}

/// Per-contributor record, keyed by platform user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Refreshed on every observed interaction.
    #[serde(default)]
    pub username: String,
    /// Opaque referral token, assigned once at first contact.
    pub token: String,
    #[serde(default)]
    pub invites: u32,
    #[serde(default)]
    pub links_added: u32,
    /// Derived from `invites` via the quota policy, recomputed eagerly.
    pub limit: u32,
    /// Advisory per-user interval, minutes. Stored and shown, never consumed
    /// by the rotation engine.
    #[serde(default)]
    pub interval: Option<u32>,
}

/// Full durable state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubSnapshot {
    pub settings: Settings,
    /// Insertion order = publish order.
    pub links: VecDeque<LinkEntry>,
    pub users: HashMap<UserId, UserRecord>,
    /// token → referrer. Entries are never removed.
    pub referrals: HashMap<String, UserId>,
}

impl HubSnapshot {
    pub fn fresh(default_interval_min: u32) -> Self {
        Self {
            settings: Settings {
                chat_id: None,
                interval: default_interval_min,
                running: false,
                last_link: None,
                rotation_index: 0,
            },
            links: VecDeque::new(),
            users: HashMap::new(),
            referrals: HashMap::new(),
        }
    }
}
