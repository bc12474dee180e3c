//! Rotation engine — pop, publish, wait.
//!
//! One cycle: snapshot settings and pop the head under the hub guard, then
//! publish and notify with the guard released. The pop is final — a failed
//! publish is logged and the link stays consumed, no redelivery. Stop is
//! cooperative: the flag is only observed at loop-top, an in-flight
//! publish or sleep always completes its cycle.

use std::sync::Arc;
use std::time::Duration;

use linkhub_core::traits::Messenger;
use linkhub_store::SharedHub;

/// Settle delay after start, and the poll cadence while idle.
const IDLE_POLL_SECS: u64 = 5;

const POOL_EXHAUSTED: &str =
    "⚠️ All links exhausted in LinkHub. Add new links to resume rotation.";

const OWNER_DRAINED: &str = "ℹ️ All your links currently used in rotation. \
Add new links or invite more users to unlock more slots.";

fn published_link(link: &str) -> String {
    format!("🔁 New invite link:\n{link}")
}

fn placeholder_link(link: &str) -> String {
    format!("🔗 Current link (last): {link}\n(Waiting for new links.)")
}

/// What a single cycle did, driving the wait that follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Not running, or no target chat configured.
    Stopped,
    /// Queue drained while active: `running` was persisted false.
    Exhausted,
    /// Head entry published; sleep this long before the next cycle.
    Published { interval_min: u32 },
}

pub struct RotationEngine {
    hub: SharedHub,
    messenger: Arc<dyn Messenger>,
    admin_id: i64,
}

impl RotationEngine {
    pub fn new(hub: SharedHub, messenger: Arc<dyn Messenger>, admin_id: i64) -> Self {
        Self { hub, messenger, admin_id }
    }

    /// Drive cycles forever. The interval is the one snapshotted at the
    /// pop, not re-read mid-sleep; idle states fall back to a short poll so
    /// an admin start is picked up promptly.
    pub async fn run(self) {
        tracing::info!("Rotation engine started");
        loop {
            tokio::time::sleep(Duration::from_secs(IDLE_POLL_SECS)).await;
            loop {
                match self.cycle().await {
                    CycleOutcome::Published { interval_min } => {
                        tokio::time::sleep(Duration::from_secs(u64::from(interval_min) * 60))
                            .await;
                    }
                    CycleOutcome::Stopped | CycleOutcome::Exhausted => break,
                }
            }
        }
    }

    /// One pop-publish-notify cycle. Public so tests (and the loop) can
    /// drive it without timers.
    pub async fn cycle(&self) -> CycleOutcome {
        // Step 1+2+3: settings snapshot, exhaustion handling, and the pop
        // are one exclusive unit.
        let (chat, entry, interval_min) = {
            let mut hub = self.hub.lock().await;
            if !hub.settings().running {
                return CycleOutcome::Stopped;
            }
            let Some(chat) = hub.settings().chat_id.clone() else {
                return CycleOutcome::Stopped;
            };
            let interval_min = hub.settings().interval;

            if hub.queue_len() == 0 {
                let last = hub.settings().last_link.clone();
                hub.stop();
                drop(hub);
                self.announce_exhaustion(&chat, last).await;
                return CycleOutcome::Exhausted;
            }

            let entry = hub.pop_next().expect("queue checked non-empty under the same guard");
            (chat, entry, interval_min)
        };

        // Step 4: publish outside the guard. The link is consumed either way.
        if let Err(e) = self.messenger.publish(&chat, &published_link(&entry.link)).await {
            tracing::error!("Failed to publish link to {chat}: {e}");
        }

        // Step 5: owner-drained check after the pop, under its own short guard.
        let drained = {
            let hub = self.hub.lock().await;
            hub.owner_remaining(entry.owner_id) == 0
        };
        if drained {
            if let Err(e) = self.messenger.notify(entry.owner_id, OWNER_DRAINED).await {
                tracing::info!("Could not DM owner {}: {e}", entry.owner_id);
            }
        }

        CycleOutcome::Published { interval_min }
    }

    /// Best-effort admin alert and last-link placeholder after the queue
    /// emptied. Delivery failure never rolls anything back.
    async fn announce_exhaustion(&self, chat: &str, last_link: Option<String>) {
        if let Err(e) = self.messenger.notify(self.admin_id, POOL_EXHAUSTED).await {
            tracing::info!("Admin notify failed: {e}");
        }
        if let Some(last) = last_link {
            if let Err(e) = self.messenger.publish(chat, &placeholder_link(&last)).await {
                tracing::info!("Placeholder publish failed: {e}");
            }
        }
    }
}
