//! # LinkHub CLI
//!
//! Shared invite-link rotation hub with referral-based slot quotas.
//!
//! Usage:
//!   linkhub serve                      # Run webhook gateway + rotation
//!   linkhub config init                # Write a config template
//!   linkhub config show                # Show effective configuration
//!   linkhub info                       # Show system info

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use linkhub_channels::TelegramChannel;
use linkhub_commands::CommandRouter;
use linkhub_core::HubConfig;
use linkhub_engine::{BackupScheduler, RotationEngine};
use linkhub_gateway::AppState;
use linkhub_store::Hub;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "linkhub",
    version,
    about = "🔗 LinkHub — invite-link rotation hub with referral quotas"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook gateway with the rotation and backup loops
    Serve {
        /// Override bind host
        #[arg(long)]
        host: Option<String>,

        /// Override bind port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show system info
    Info,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (token masked)
    Show,
    /// Write a config template to the default path
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "linkhub=debug,linkhub_store=debug,linkhub_engine=debug,tower_http=debug"
    } else {
        "linkhub=info,linkhub_store=info,linkhub_engine=info,linkhub_gateway=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => HubConfig::load_from(path).context("load config")?,
        None => HubConfig::load().context("load config")?,
    };

    match cli.command {
        Commands::Serve { host, port } => serve(config, host, port).await,
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let masked = config.masked();
                println!("{}", toml::to_string_pretty(&masked)?);
                Ok(())
            }
            ConfigAction::Init => {
                let path = HubConfig::default_path();
                HubConfig::default().save_to(&path)?;
                println!("✅ Config template written to {}", path.display());
                Ok(())
            }
        },
        Commands::Info => {
            println!("🔗 LinkHub v{}", env!("CARGO_PKG_VERSION"));
            println!("Platform: {}/{}", std::env::consts::OS, std::env::consts::ARCH);
            println!("Data file: {}", config.data_file.display());
            println!("Gateway: {}:{}", config.gateway.host, config.gateway.port);
            Ok(())
        }
    }
}

async fn serve(config: HubConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    if config.bot_token.is_empty() {
        bail!("No bot token configured. Set LINKHUB_BOT_TOKEN or edit config.toml.");
    }
    if config.admin_id == 0 {
        bail!("No admin id configured. Set LINKHUB_ADMIN_ID or edit config.toml.");
    }

    let hub = Hub::open(&config.data_file, config.default_interval_min)
        .context("open snapshot")?
        .into_shared();
    let telegram = Arc::new(TelegramChannel::new(config.bot_token.clone()));

    match telegram.get_me().await {
        Ok(me) => tracing::info!(
            "Bot: @{} ({})",
            me.username.as_deref().unwrap_or("?"),
            me.id
        ),
        Err(e) => tracing::warn!("getMe failed (serving anyway): {e}"),
    }

    let router = CommandRouter::new(hub.clone(), telegram.clone(), config.admin_id);

    let rotation = RotationEngine::new(hub.clone(), telegram.clone(), config.admin_id);
    tokio::spawn(rotation.run());

    let backup = BackupScheduler::new(
        hub,
        telegram.clone(),
        config.admin_id,
        config.backup_interval_hours,
    );
    tokio::spawn(backup.run());

    let state = Arc::new(AppState::new(router, telegram, config.bot_token.clone()));
    let host = host.unwrap_or(config.gateway.host);
    let port = port.unwrap_or(config.gateway.port);
    linkhub_gateway::serve(state, &host, port)
        .await
        .context("gateway")?;
    Ok(())
}
