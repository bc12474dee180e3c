//! Backup scheduler — periodic snapshot archive.
//!
//! Copies the raw data file to a timestamped sibling every N hours and
//! tells the admin. Failures are logged and waited out until the next
//! fire, never retried early.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use linkhub_core::error::Result;
use linkhub_core::traits::Messenger;
use linkhub_store::SharedHub;

pub struct BackupScheduler {
    hub: SharedHub,
    messenger: Arc<dyn Messenger>,
    admin_id: i64,
    interval_hours: u64,
}

impl BackupScheduler {
    pub fn new(
        hub: SharedHub,
        messenger: Arc<dyn Messenger>,
        admin_id: i64,
        interval_hours: u64,
    ) -> Self {
        Self { hub, messenger, admin_id, interval_hours }
    }

    pub async fn run(self) {
        tracing::info!("Backup scheduler started (every {}h)", self.interval_hours);
        loop {
            tokio::time::sleep(Duration::from_secs(self.interval_hours * 3600)).await;
            match self.backup_once().await {
                Ok(name) => tracing::info!("Backup created: {name}"),
                Err(e) => tracing::error!("Backup failed: {e}"),
            }
        }
    }

    /// Copy the snapshot under the hub guard (a consistent read of the raw
    /// file), then notify the admin after release.
    pub async fn backup_once(&self) -> Result<String> {
        let name = {
            let hub = self.hub.lock().await;
            let path = hub.snapshot_path();
            let stamp = Utc::now().format("%Y%m%d%H%M%S");
            let name = format!("data-backup-{stamp}.json");
            let archive = path.with_file_name(&name);
            std::fs::copy(path, &archive)?;
            name
        };

        let note = format!(
            "🔐 Backup created: {name} (stored on server). \
             If you need the file, request /getbackup."
        );
        if let Err(e) = self.messenger.notify(self.admin_id, &note).await {
            tracing::info!("Backup notify failed: {e}");
        }
        Ok(name)
    }
}
