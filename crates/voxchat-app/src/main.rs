//! Voxchat application binary - composition root.
//!
//! Ties together all Voxchat crates into a single executable:
//! 1. Resolve configuration (CLI > environment > TOML file > defaults)
//! 2. Validate it and install logging
//! 3. Build the language-model and speech collaborators
//! 4. Start the session expiry sweeper
//! 5. Serve the axum REST API until Ctrl-C

mod cli;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use voxchat_api::state::AppState;
use voxchat_chat::ChatOrchestrator;
use voxchat_core::{VoxchatConfig, VoxchatError};

use crate::cli::CliArgs;

/// Periodically drop sessions idle past the configured timeout.
async fn expiry_sweeper(orchestrator: Arc<ChatOrchestrator>, interval_secs: u64) {
    tracing::info!(interval_secs, "Session expiry sweeper started");

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        interval.tick().await;
        match orchestrator.sessions().purge_expired() {
            Ok(0) => {}
            Ok(purged) => tracing::debug!(purged, "Expired sessions removed"),
            Err(e) => tracing::warn!(error = %e, "Session sweep failed"),
        }
    }
}

/// Load the config file. A missing file means defaults; an unreadable one
/// is reported once logging is up.
fn load_config(path: &Path) -> (VoxchatConfig, Option<VoxchatError>) {
    if !path.exists() {
        return (VoxchatConfig::default(), None);
    }
    match VoxchatConfig::load(path) {
        Ok(config) => (config, None),
        Err(e) => (VoxchatConfig::default(), Some(e)),
    }
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliArgs::parse();

    // Config.
    let config_file = cli.resolve_config_path();
    let (mut config, load_error) = load_config(&config_file);
    config.apply_env_overrides()?;
    cli.apply_overrides(&mut config);

    // Tracing.
    init_tracing(&config.general.log_level);
    tracing::info!("Starting Voxchat v{}", env!("CARGO_PKG_VERSION"));

    match load_error {
        None if config_file.exists() => {
            tracing::info!(path = %config_file.display(), "Configuration loaded")
        }
        None => tracing::info!(path = %config_file.display(), "No config file, using defaults"),
        Some(e) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Failed to load config file, using defaults"
        ),
    }

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    if cli.check_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        println!("Configuration OK");
        return Ok(());
    }

    // Collaborators.
    let lm = voxchat_llm::build_language_model(&config.lm)?;
    let recognizer = voxchat_speech::build_recognizer(&config.speech)?;
    let synthesizer = voxchat_speech::build_synthesizer(&config.speech)?;

    let orchestrator = ChatOrchestrator::new(&config.chat, lm, recognizer, synthesizer);
    let state = AppState::new(config.clone(), orchestrator);

    // === Background tasks ===

    if config.chat.session_timeout_minutes > 0 && config.chat.sweep_interval_secs > 0 {
        let orchestrator = Arc::clone(&state.orchestrator);
        let interval_secs = config.chat.sweep_interval_secs;
        tokio::spawn(async move {
            expiry_sweeper(orchestrator, interval_secs).await;
        });
    } else {
        tracing::info!("Session expiry disabled");
    }

    // === API server ===

    voxchat_api::start_server(&config, state).await?;

    Ok(())
}
