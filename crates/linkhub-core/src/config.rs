//! Configuration — `~/.linkhub/config.toml` plus environment overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LinkHubError, Result};

/// Gateway (webhook server) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

/// Top-level LinkHub configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Bot API token from BotFather. Required to serve.
    #[serde(default)]
    pub bot_token: String,
    /// Owner user id — the only identity admin commands are accepted from.
    #[serde(default)]
    pub admin_id: i64,
    /// Durable snapshot path.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
    /// Process-wide rotation interval default, minutes.
    #[serde(default = "default_interval_min")]
    pub default_interval_min: u32,
    /// Backup scheduler cadence, hours.
    #[serde(default = "default_backup_hours")]
    pub backup_interval_hours: u64,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_data_file() -> PathBuf {
    HubConfig::home_dir().join("data.json")
}
fn default_interval_min() -> u32 {
    30
}
fn default_backup_hours() -> u64 {
    6
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            admin_id: 0,
            data_file: default_data_file(),
            default_interval_min: default_interval_min(),
            backup_interval_hours: default_backup_hours(),
            gateway: GatewayConfig::default(),
        }
    }
}

impl HubConfig {
    /// `~/.linkhub`
    pub fn home_dir() -> PathBuf {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".linkhub")
    }

    /// Default config file path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Load from the default path (or defaults when absent), then apply
    /// environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load from an explicit path; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)
                .map_err(|e| LinkHubError::Config(format!("Parse {}: {e}", path.display())))?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Environment variables win over the file, matching deploy-time usage.
    fn apply_env(&mut self) {
        if let Ok(token) = std::env::var("LINKHUB_BOT_TOKEN") {
            self.bot_token = token;
        }
        if let Ok(id) = std::env::var("LINKHUB_ADMIN_ID") {
            if let Ok(id) = id.parse() {
                self.admin_id = id;
            }
        }
        if let Ok(file) = std::env::var("LINKHUB_DATA_FILE") {
            self.data_file = PathBuf::from(shellexpand::tilde(&file).to_string());
        }
        if let Ok(min) = std::env::var("LINKHUB_INTERVAL_MIN") {
            if let Ok(min) = min.parse() {
                self.default_interval_min = min;
            }
        }
        if let Ok(hours) = std::env::var("LINKHUB_BACKUP_HOURS") {
            if let Ok(hours) = hours.parse() {
                self.backup_interval_hours = hours;
            }
        }
        if let Ok(host) = std::env::var("LINKHUB_HOST") {
            self.gateway.host = host;
        }
        if let Ok(port) = std::env::var("LINKHUB_PORT") {
            if let Ok(port) = port.parse() {
                self.gateway.port = port;
            }
        }
    }

    /// Write the config as TOML, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| LinkHubError::Config(format!("Serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Effective config with the token masked, for `config show`.
    pub fn masked(&self) -> Self {
        let mut masked = self.clone();
        if !masked.bot_token.is_empty() {
            let head: String = masked.bot_token.chars().take(6).collect();
            masked.bot_token = format!("{head}…");
        }
        masked
    }
}
