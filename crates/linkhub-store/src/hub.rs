//! The Hub — exclusive-access store over the durable snapshot.
//!
//! Every public method is one read-modify-write unit. Callers hold the
//! `SharedHub` mutex guard across the whole call, never across an outbound
//! network call. Mutating methods persist write-through before returning.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use linkhub_core::error::{LinkHubError, Result};
use linkhub_core::types::{Identity, UserId};
use rand::RngCore;
use tokio::sync::Mutex;

use crate::quota::limit_for_invites;
use crate::snapshot::{HubSnapshot, LinkEntry, Settings, UserRecord};

/// Shared handle: one single-writer mutual-exclusion domain for the store.
pub type SharedHub = Arc<Mutex<Hub>>;

/// Outcome of a batch admission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    /// Links actually queued; the remainder of the batch was dropped.
    pub admitted: usize,
    /// The contributor's total queued links after admission.
    pub total_owned: u32,
}

/// A referral attribution that was credited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferralCredit {
    pub referrer: UserId,
    pub invites: u32,
    pub limit: u32,
}

pub struct Hub {
    data: HubSnapshot,
    path: PathBuf,
}

impl Hub {
    /// Load the snapshot at `path`, or initialize fresh defaults (and write
    /// them) when no file exists yet.
    pub fn open(path: impl Into<PathBuf>, default_interval_min: u32) -> Result<Self> {
        let path = path.into();
        let data = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)
                .map_err(|e| LinkHubError::Storage(format!("Parse {}: {e}", path.display())))?
        } else {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            HubSnapshot::fresh(default_interval_min)
        };
        let hub = Self { data, path };
        hub.persist();
        Ok(hub)
    }

    /// Wrap into the shared single-writer handle.
    pub fn into_shared(self) -> SharedHub {
        Arc::new(Mutex::new(self))
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.path
    }

    /// Write-through save. A failure is logged; the in-memory state stays
    /// authoritative until the next successful save.
    fn persist(&self) {
        match serde_json::to_string_pretty(&self.data) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.path, json) {
                    tracing::warn!("Snapshot save failed ({}): {e}", self.path.display());
                }
            }
            Err(e) => tracing::warn!("Snapshot serialize failed: {e}"),
        }
    }

    // ── Users & referrals ───────────────────────────────

    /// Create the user record on first contact (fresh token, referral-index
    /// entry), or refresh the stored username. Returns a copy of the record.
    pub fn ensure_user(&mut self, who: &Identity) -> UserRecord {
        if !self.data.users.contains_key(&who.id) {
            let token = self.fresh_token();
            self.data.users.insert(
                who.id,
                UserRecord {
                    username: who.username.clone().unwrap_or_default(),
                    token: token.clone(),
                    invites: 0,
                    links_added: 0,
                    limit: limit_for_invites(0),
                    interval: None,
                },
            );
            self.data.referrals.insert(token, who.id);
            self.persist();
        } else if let Some(name) = &who.username {
            let record = self.data.users.get_mut(&who.id).expect("checked above");
            if &record.username != name {
                record.username = name.clone();
                self.persist();
            }
        }
        self.data.users[&who.id].clone()
    }

    /// Random URL-safe token, retried on the (unlikely) collision.
    fn fresh_token(&self) -> String {
        loop {
            let mut bytes = [0u8; 8];
            rand::thread_rng().fill_bytes(&mut bytes);
            let token = URL_SAFE_NO_PAD.encode(bytes);
            if !self.data.referrals.contains_key(&token) {
                return token;
            }
        }
    }

    /// Attribute a join to the token's owner. Unknown tokens and
    /// self-referrals are silently ignored. On credit, the referrer's invite
    /// count rises and their limit is recomputed eagerly.
    pub fn credit_referral(&mut self, token: &str, new_user: UserId) -> Option<ReferralCredit> {
        let referrer = *self.data.referrals.get(token)?;
        if referrer == new_user {
            return None;
        }
        let record = self.data.users.get_mut(&referrer)?;
        record.invites += 1;
        record.limit = limit_for_invites(record.invites);
        let credit = ReferralCredit {
            referrer,
            invites: record.invites,
            limit: record.limit,
        };
        self.persist();
        Some(credit)
    }

    pub fn user(&self, id: UserId) -> Option<&UserRecord> {
        self.data.users.get(&id)
    }

    /// All known user ids, for broadcast fan-out outside the lock.
    pub fn user_ids(&self) -> Vec<UserId> {
        self.data.users.keys().copied().collect()
    }

    /// Top `n` users by invite count, descending.
    pub fn leaderboard(&self, n: usize) -> Vec<(UserId, UserRecord)> {
        let mut ranked: Vec<_> = self
            .data
            .users
            .iter()
            .map(|(id, u)| (*id, u.clone()))
            .collect();
        ranked.sort_by(|a, b| b.1.invites.cmp(&a.1.invites));
        ranked.truncate(n);
        ranked
    }

    // ── Link admission / removal ────────────────────────

    /// Admit up to the contributor's free slots, in submitted order. The
    /// whole check-and-append runs under the caller's guard, so two
    /// concurrent admissions cannot both pass the check.
    pub fn admit_links(&mut self, who: &Identity, candidates: &[String]) -> Result<Admission> {
        self.ensure_user(who);
        let record = self.data.users.get_mut(&who.id).expect("ensured above");
        let allowed = record.limit.saturating_sub(record.links_added) as usize;
        if allowed == 0 {
            return Err(LinkHubError::QuotaExceeded { limit: record.limit });
        }

        let now = Utc::now();
        let take = candidates.len().min(allowed);
        for link in &candidates[..take] {
            self.data.links.push_back(LinkEntry {
                link: link.clone(),
                owner_id: who.id,
                owner_username: who.username.clone().unwrap_or_default(),
                added_at: now,
            });
        }
        let record = self.data.users.get_mut(&who.id).expect("ensured above");
        record.links_added += take as u32;
        let total_owned = record.links_added;
        self.persist();
        Ok(Admission { admitted: take, total_owned })
    }

    /// The contributor's own view of the queue, in queue order.
    pub fn links_of(&self, owner: UserId) -> Vec<LinkEntry> {
        self.data
            .links
            .iter()
            .filter(|l| l.owner_id == owner)
            .cloned()
            .collect()
    }

    /// How many entries `owner` still has queued.
    pub fn owner_remaining(&self, owner: UserId) -> usize {
        self.data.links.iter().filter(|l| l.owner_id == owner).count()
    }

    /// Remove the entry at `index` (1-based, into the owner's own view).
    /// Out-of-range indices change nothing.
    pub fn remove_link(&mut self, owner: UserId, index: usize) -> Result<LinkEntry> {
        if index == 0 {
            return Err(LinkHubError::InvalidIndex);
        }
        let global_pos = self
            .data
            .links
            .iter()
            .enumerate()
            .filter(|(_, l)| l.owner_id == owner)
            .nth(index - 1)
            .map(|(pos, _)| pos)
            .ok_or(LinkHubError::InvalidIndex)?;

        let entry = self
            .data
            .links
            .remove(global_pos)
            .ok_or(LinkHubError::InvalidIndex)?;
        if let Some(record) = self.data.users.get_mut(&owner) {
            record.links_added = record.links_added.saturating_sub(1);
        }
        self.persist();
        Ok(entry)
    }

    // ── Rotation support ────────────────────────────────

    /// Dequeue the oldest entry, record it as last published, reset the
    /// legacy cursor, and release the owner's slot.
    pub fn pop_next(&mut self) -> Option<LinkEntry> {
        let entry = self.data.links.pop_front()?;
        self.data.settings.last_link = Some(entry.link.clone());
        self.data.settings.rotation_index = 0;
        if let Some(record) = self.data.users.get_mut(&entry.owner_id) {
            record.links_added = record.links_added.saturating_sub(1);
        }
        self.persist();
        Some(entry)
    }

    pub fn queue_len(&self) -> usize {
        self.data.links.len()
    }

    // ── Settings ────────────────────────────────────────

    pub fn settings(&self) -> &Settings {
        &self.data.settings
    }

    pub fn set_chat(&mut self, chat: impl Into<String>) {
        self.data.settings.chat_id = Some(chat.into());
        self.persist();
    }

    pub fn set_interval(&mut self, minutes: u32) -> Result<()> {
        if minutes == 0 {
            return Err(LinkHubError::validation("Interval must be at least 1 minute"));
        }
        self.data.settings.interval = minutes;
        self.persist();
        Ok(())
    }

    /// Start rotation. Requires a target chat; refuses when already running.
    pub fn start(&mut self) -> Result<()> {
        if self.data.settings.chat_id.is_none() {
            return Err(LinkHubError::validation("Set target chat first using /setchat"));
        }
        if self.data.settings.running {
            return Err(LinkHubError::validation("Rotation already running"));
        }
        self.data.settings.running = true;
        self.persist();
        Ok(())
    }

    pub fn stop(&mut self) {
        self.data.settings.running = false;
        self.persist();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_hub() -> (Hub, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let hub = Hub::open(dir.path().join("data.json"), 30).expect("open");
        (hub, dir)
    }

    fn ident(id: UserId, name: &str) -> Identity {
        Identity::new(id, Some(name.into()))
    }

    fn links(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("https://t.me/+link{i}")).collect()
    }

    #[test]
    fn test_first_contact_creates_record_and_referral_entry() {
        let (mut hub, _dir) = test_hub();
        let record = hub.ensure_user(&ident(1, "alice"));
        assert_eq!(record.limit, 5);
        assert_eq!(record.invites, 0);
        assert!(!record.token.is_empty());
        // The token is live in the referral index immediately.
        let credit = hub.credit_referral(&record.token, 2).expect("token registered");
        assert_eq!(credit.referrer, 1);
        assert_eq!(credit.invites, 1);
    }

    #[test]
    fn test_username_refreshed_token_stable() {
        let (mut hub, _dir) = test_hub();
        let first = hub.ensure_user(&ident(1, "alice"));
        let second = hub.ensure_user(&ident(1, "alice_renamed"));
        assert_eq!(first.token, second.token);
        assert_eq!(second.username, "alice_renamed");
    }

    #[test]
    fn test_referral_credit_and_eager_limit_recompute() {
        let (mut hub, _dir) = test_hub();
        let referrer = hub.ensure_user(&ident(1, "alice"));

        for joiner in 2..=20 {
            hub.ensure_user(&ident(joiner, "joiner"));
            let credit = hub.credit_referral(&referrer.token, joiner).expect("credit");
            assert_eq!(credit.referrer, 1);
        }
        let record = hub.user(1).expect("record");
        assert_eq!(record.invites, 19);
        assert_eq!(record.limit, 5);

        hub.credit_referral(&referrer.token, 21).expect("20th credit");
        let record = hub.user(1).expect("record");
        assert_eq!(record.invites, 20);
        assert_eq!(record.limit, 10);
    }

    #[test]
    fn test_no_self_referral() {
        let (mut hub, _dir) = test_hub();
        let record = hub.ensure_user(&ident(1, "alice"));
        assert!(hub.credit_referral(&record.token, 1).is_none());
        assert_eq!(hub.user(1).expect("record").invites, 0);
    }

    #[test]
    fn test_unknown_token_ignored() {
        let (mut hub, _dir) = test_hub();
        hub.ensure_user(&ident(1, "alice"));
        assert!(hub.credit_referral("no-such-token", 1).is_none());
    }

    #[test]
    fn test_admission_caps_at_free_slots() {
        let (mut hub, _dir) = test_hub();
        let outcome = hub.admit_links(&ident(1, "u"), &links(7)).expect("admit");
        assert_eq!(outcome.admitted, 5);
        assert_eq!(outcome.total_owned, 5);
        assert_eq!(hub.queue_len(), 5);
        // The 2 overflow links were dropped, not queued for later.
        assert_eq!(hub.owner_remaining(1), 5);
    }

    #[test]
    fn test_admission_rejects_full_quota() {
        let (mut hub, _dir) = test_hub();
        hub.admit_links(&ident(1, "u"), &links(5)).expect("fill");
        let err = hub.admit_links(&ident(1, "u"), &links(1)).expect_err("full");
        assert!(matches!(err, LinkHubError::QuotaExceeded { limit: 5 }));
        assert_eq!(hub.queue_len(), 5);
    }

    #[test]
    fn test_admission_per_user_independent() {
        let (mut hub, _dir) = test_hub();
        hub.admit_links(&ident(1, "a"), &links(5)).expect("a");
        let outcome = hub.admit_links(&ident(2, "b"), &links(3)).expect("b");
        assert_eq!(outcome.admitted, 3);
        assert_eq!(hub.owner_remaining(1), 5);
        assert_eq!(hub.owner_remaining(2), 3);
    }

    #[test]
    fn test_remove_link_by_owner_view_index() {
        let (mut hub, _dir) = test_hub();
        hub.admit_links(&ident(1, "a"), &["a1".into(), "a2".into()]).expect("a");
        hub.admit_links(&ident(2, "b"), &["b1".into()]).expect("b");
        hub.admit_links(&ident(1, "a"), &["a3".into()]).expect("a again");

        // Owner 1's view is [a1, a2, a3]; index 2 removes a2 from the
        // interleaved global queue.
        let removed = hub.remove_link(1, 2).expect("remove");
        assert_eq!(removed.link, "a2");
        assert_eq!(hub.user(1).expect("record").links_added, 2);
        assert_eq!(hub.owner_remaining(2), 1);

        let remaining: Vec<_> = hub.links_of(1).iter().map(|l| l.link.clone()).collect();
        assert_eq!(remaining, vec!["a1", "a3"]);
    }

    #[test]
    fn test_remove_invalid_index_changes_nothing() {
        let (mut hub, _dir) = test_hub();
        hub.admit_links(&ident(1, "a"), &links(3)).expect("admit");

        assert!(matches!(hub.remove_link(1, 0), Err(LinkHubError::InvalidIndex)));
        assert!(matches!(hub.remove_link(1, 4), Err(LinkHubError::InvalidIndex)));
        assert!(matches!(hub.remove_link(9, 1), Err(LinkHubError::InvalidIndex)));

        assert_eq!(hub.queue_len(), 3);
        assert_eq!(hub.user(1).expect("record").links_added, 3);
    }

    #[test]
    fn test_links_added_tracks_queue_membership() {
        let (mut hub, _dir) = test_hub();
        let who = ident(1, "u");
        hub.admit_links(&who, &links(4)).expect("admit");
        hub.remove_link(1, 1).expect("remove");
        hub.admit_links(&who, &links(1)).expect("re-admit");
        hub.remove_link(1, 3).expect("remove tail");

        assert_eq!(hub.user(1).expect("record").links_added as usize, hub.owner_remaining(1));
    }

    #[test]
    fn test_pop_is_fifo_and_updates_last_link() {
        let (mut hub, _dir) = test_hub();
        hub.admit_links(&ident(1, "a"), &["first".into(), "second".into()]).expect("a");
        hub.admit_links(&ident(2, "b"), &["third".into()]).expect("b");

        assert_eq!(hub.pop_next().expect("pop").link, "first");
        assert_eq!(hub.settings().last_link.as_deref(), Some("first"));
        assert_eq!(hub.pop_next().expect("pop").link, "second");
        assert_eq!(hub.pop_next().expect("pop").link, "third");
        assert!(hub.pop_next().is_none());
        assert_eq!(hub.settings().rotation_index, 0);
    }

    #[test]
    fn test_pop_releases_owner_slot() {
        let (mut hub, _dir) = test_hub();
        hub.admit_links(&ident(1, "a"), &links(5)).expect("fill");
        hub.pop_next().expect("pop");
        assert_eq!(hub.user(1).expect("record").links_added, 4);
        // A slot freed by rotation can be refilled.
        let outcome = hub.admit_links(&ident(1, "a"), &links(2)).expect("refill");
        assert_eq!(outcome.admitted, 1);
    }

    #[test]
    fn test_start_requires_chat_and_not_running() {
        let (mut hub, _dir) = test_hub();
        assert!(matches!(hub.start(), Err(LinkHubError::Validation(_))));

        hub.set_chat("@pool");
        hub.start().expect("start");
        assert!(hub.settings().running);
        assert!(matches!(hub.start(), Err(LinkHubError::Validation(_))));

        hub.stop();
        assert!(!hub.settings().running);
    }

    #[test]
    fn test_set_interval_validation() {
        let (mut hub, _dir) = test_hub();
        assert!(hub.set_interval(0).is_err());
        hub.set_interval(45).expect("set");
        assert_eq!(hub.settings().interval, 45);
    }

    #[test]
    fn test_leaderboard_ranked_by_invites() {
        let (mut hub, _dir) = test_hub();
        let a = hub.ensure_user(&ident(1, "a"));
        let b = hub.ensure_user(&ident(2, "b"));
        hub.ensure_user(&ident(3, "c"));
        hub.credit_referral(&b.token, 3).expect("credit b");
        hub.credit_referral(&b.token, 1).expect("credit b");
        hub.credit_referral(&a.token, 2).expect("credit a");

        let ranked = hub.leaderboard(10);
        assert_eq!(ranked[0].0, 2);
        assert_eq!(ranked[0].1.invites, 2);
        assert_eq!(ranked[1].0, 1);
    }

    #[test]
    fn test_persistence_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data.json");
        {
            let mut hub = Hub::open(&path, 30).expect("open");
            hub.set_chat("@pool");
            hub.admit_links(&ident(1, "a"), &links(2)).expect("admit");
        }
        let hub = Hub::open(&path, 30).expect("reopen");
        assert_eq!(hub.settings().chat_id.as_deref(), Some("@pool"));
        assert_eq!(hub.queue_len(), 2);
        assert_eq!(hub.user(1).expect("record").links_added, 2);
    }

    #[test]
    fn test_end_to_end_quota_scenario() {
        // Contributor with limit 5 submits 7 → 5 admitted, 2 dropped;
        // removing index 1 frees exactly that slot.
        let (mut hub, _dir) = test_hub();
        hub.admit_links(&ident(2, "other"), &["o1".into()]).expect("other");

        let outcome = hub.admit_links(&ident(1, "u"), &links(7)).expect("admit");
        assert_eq!(outcome.admitted, 5);
        assert_eq!(hub.user(1).expect("record").links_added, 5);

        let removed = hub.remove_link(1, 1).expect("remove");
        assert_eq!(removed.link, "https://t.me/+link0");
        assert_eq!(hub.user(1).expect("record").links_added, 4);
        assert_eq!(hub.owner_remaining(1), 4);
        assert_eq!(hub.owner_remaining(2), 1);
    }
}
