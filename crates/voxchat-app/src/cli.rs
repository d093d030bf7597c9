//! CLI argument definitions for the Voxchat server.
//!
//! Flags take priority over `VOXCHAT_*` environment variables, which take
//! priority over the config file.

use clap::Parser;
use std::path::PathBuf;

use voxchat_core::VoxchatConfig;

/// Voxchat - a typed and spoken chat server backed by a hosted language model.
#[derive(Parser, Debug)]
#[command(name = "voxchat", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Bind address for the API server.
    #[arg(long = "host")]
    pub host: Option<String>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Validate the resolved configuration, print it, and exit.
    #[arg(long = "check-config")]
    pub check_config: bool,
}

impl CliArgs {
    /// Which config file to read.
    ///
    /// Priority: --config flag > VOXCHAT_CONFIG env var > ~/.voxchat/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("VOXCHAT_CONFIG") {
            if !p.trim().is_empty() {
                return PathBuf::from(p);
            }
        }
        default_config_path()
    }

    /// Apply flag overrides on top of the file + environment configuration.
    pub fn apply_overrides(&self, config: &mut VoxchatConfig) {
        if let Some(ref host) = self.host {
            config.general.host = host.clone();
        }
        if let Some(port) = self.port {
            config.general.port = port;
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
    }
}

/// `~/.voxchat/config.toml`, or `config.toml` when no home dir is known.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".voxchat").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".voxchat").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = CliArgs::try_parse_from([
            "voxchat",
            "--config",
            "/tmp/vox.toml",
            "--host",
            "127.0.0.1",
            "-p",
            "9000",
            "--log-level",
            "debug",
            "--check-config",
        ])
        .unwrap();
        assert_eq!(cli.resolve_config_path(), PathBuf::from("/tmp/vox.toml"));
        assert_eq!(cli.port, Some(9000));
        assert!(cli.check_config);
    }

    #[test]
    fn test_flags_override_config() {
        let cli = CliArgs::try_parse_from(["voxchat", "--port", "9100", "-l", "warn"]).unwrap();
        let mut config = VoxchatConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.general.port, 9100);
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.general.host, "0.0.0.0");
    }

    #[test]
    fn test_no_flags_leave_config_alone() {
        let cli = CliArgs::try_parse_from(["voxchat"]).unwrap();
        let mut config = VoxchatConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.general.port, 8000);
        assert!(!cli.check_config);
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(CliArgs::try_parse_from(["voxchat", "--port", "99999"]).is_err());
    }
}
