//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use voxchat_chat::ChatOrchestrator;
use voxchat_core::VoxchatConfig;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Resolved configuration, read-only after startup.
    pub config: Arc<VoxchatConfig>,
    /// Turn-taking engine owning every session.
    pub orchestrator: Arc<ChatOrchestrator>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: VoxchatConfig, orchestrator: ChatOrchestrator) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            start_time: Instant::now(),
        }
    }
}
