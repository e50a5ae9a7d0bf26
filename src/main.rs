//! # PushRelay
//! Push-notification relay and schedule-assistant chat backend.
//!
//! Usage:
//!   pushrelay                          # Serve with ~/.pushrelay/config.toml
//!   pushrelay --config ./relay.toml    # Custom config file
//!   pushrelay --port 9000              # Override the listen port

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use pushrelay_chat::{ChatResponder, ChatStore, LlmClient};
use pushrelay_core::config::PushRelayConfig;
use pushrelay_dispatch::{Dispatcher, TopicManager};
use pushrelay_gateway::AppState;
use pushrelay_provider::FcmClient;

#[derive(Parser)]
#[command(
    name = "pushrelay",
    version,
    about = "Push-notification relay and schedule-assistant chat backend"
)]
struct Cli {
    /// Config file path (default: ~/.pushrelay/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the gateway listen host
    #[arg(long)]
    host: Option<String>,

    /// Override the gateway listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "pushrelay=debug,tower_http=debug"
    } else {
        "pushrelay=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let mut config = match &cli.config {
        Some(path) => PushRelayConfig::load_from(path)?,
        None => PushRelayConfig::load()?,
    };
    if let Some(host) = cli.host {
        config.gateway.host = host;
    }
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }

    // One provider client for the whole process; every dispatcher shares it.
    let provider = Arc::new(FcmClient::new(&config.fcm));
    let dispatcher = Arc::new(Dispatcher::new(provider.clone()));
    let topics = Arc::new(TopicManager::new(provider));
    if config.fcm.project_id.is_empty() {
        tracing::warn!("fcm.project_id is not configured — push sends will fail");
    }

    let db_path = config.storage.resolve_db_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = Arc::new(ChatStore::open(&db_path)?);
    tracing::info!("Chat store: {}", db_path.display());

    let llm = if config.chat.enabled {
        let client = LlmClient::new(&config.chat);
        if client.is_configured() {
            tracing::info!("LLM client ready ({})", config.chat.model);
        } else {
            tracing::warn!("LLM API key not set — chat will use the keyword analyzer");
        }
        Some(client)
    } else {
        None
    };
    let responder = Arc::new(ChatResponder::new(llm, store));

    let state = AppState {
        dispatcher,
        topics,
        responder,
        start_time: std::time::Instant::now(),
    };

    pushrelay_gateway::start(&config.gateway, state).await
}
