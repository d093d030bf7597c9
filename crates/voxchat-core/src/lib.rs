//! Shared types, configuration, and errors for Voxchat.
//!
//! Every other crate in the workspace depends on this one for the
//! conversation data model (turns, roles, modalities, output modes) and for
//! the TOML + environment configuration layer.

pub mod config;
pub mod error;
pub mod types;

pub use config::VoxchatConfig;
pub use error::{Result, VoxchatError};
pub use types::*;
