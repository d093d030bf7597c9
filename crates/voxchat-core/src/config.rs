use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, VoxchatError};
use crate::types::OutputMode;

/// Top-level configuration for the Voxchat server.
///
/// Loaded from `~/.voxchat/config.toml` by default, then overridden from
/// the environment. Each section corresponds to one collaborator or
/// bounded context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoxchatConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub lm: LmConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
}

impl VoxchatConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: VoxchatConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    ///
    /// API keys are never written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| VoxchatError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Apply `VOXCHAT_*` (and provider key) overrides from the process
    /// environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Unset or blank variables leave the current value untouched; values
    /// that fail to parse are reported as configuration errors.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("VOXCHAT_HOST") {
            self.general.host = v;
        }
        if let Some(v) = get("VOXCHAT_PORT") {
            self.general.port = parse_var("VOXCHAT_PORT", &v)?;
        }
        if let Some(v) = get("VOXCHAT_LOG_LEVEL") {
            self.general.log_level = v;
        }
        if let Some(v) = get("VOXCHAT_CONFIDENCE_THRESHOLD") {
            self.chat.confidence_threshold = parse_var("VOXCHAT_CONFIDENCE_THRESHOLD", &v)?;
        }
        if let Some(v) = get("VOXCHAT_CONTEXT_WINDOW_TURNS") {
            self.chat.context_window_turns = parse_var("VOXCHAT_CONTEXT_WINDOW_TURNS", &v)?;
        }
        if let Some(v) = get("VOXCHAT_LM_TIMEOUT_MS") {
            self.chat.lm_timeout_ms = parse_var("VOXCHAT_LM_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = get("VOXCHAT_OUTPUT_MODE") {
            self.chat.output_mode = v.parse()?;
        }
        if let Some(v) = get("VOXCHAT_LM_PROVIDER") {
            self.lm.provider = v.parse()?;
        }
        if let Some(v) = get("VOXCHAT_LM_MODEL") {
            self.lm.model = v;
        }
        if let Some(v) = get("VOXCHAT_LM_BASE_URL") {
            self.lm.base_url = Some(v);
        }
        if let Some(v) = get("VOXCHAT_STT_URL") {
            self.speech.stt_url = Some(v);
        }
        if let Some(v) = get("VOXCHAT_TTS_URL") {
            self.speech.tts_url = Some(v);
        }

        let key_var = self.lm.provider.api_key_var();
        if let Some(v) = get(key_var) {
            self.lm.api_key = Some(v);
        }

        Ok(())
    }

    /// Check that every value is usable. Run once at startup.
    pub fn validate(&self) -> Result<()> {
        let chat = &self.chat;
        if !chat.confidence_threshold.is_finite()
            || !(0.0..=1.0).contains(&chat.confidence_threshold)
        {
            return Err(VoxchatError::Config(format!(
                "chat.confidence_threshold must be within [0, 1], got {}",
                chat.confidence_threshold
            )));
        }
        if chat.lm_timeout_ms == 0 {
            return Err(VoxchatError::Config(
                "chat.lm_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if chat.max_message_chars == 0 {
            return Err(VoxchatError::Config(
                "chat.max_message_chars must be greater than 0".to_string(),
            ));
        }
        if !self.lm.temperature.is_finite() || !(0.0..=2.0).contains(&self.lm.temperature) {
            return Err(VoxchatError::Config(format!(
                "lm.temperature must be within [0, 2], got {}",
                self.lm.temperature
            )));
        }
        if self.lm.model.trim().is_empty() {
            return Err(VoxchatError::Config("lm.model must not be empty".to_string()));
        }
        if self.lm.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            return Err(VoxchatError::Config(format!(
                "Missing required environment variable: {}",
                self.lm.provider.api_key_var()
            )));
        }
        if !(0.0..=1.0).contains(&self.speech.tts_volume) {
            return Err(VoxchatError::Config(format!(
                "speech.tts_volume must be within [0, 1], got {}",
                self.speech.tts_volume
            )));
        }
        Ok(())
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| VoxchatError::Config(format!("invalid value for {}: '{}' ({})", key, value, e)))
}

/// General server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Bind address for the HTTP server.
    pub host: String,
    /// HTTP server port.
    pub port: u16,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Global request budget per second.
    pub rate_limit_per_sec: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            log_level: "info".to_string(),
            rate_limit_per_sec: 100,
        }
    }
}

/// Turn-taking and session policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Minimum recognizer confidence accepted for spoken input.
    pub confidence_threshold: f32,
    /// Most recent turns sent to the language model; 0 sends the full log.
    pub context_window_turns: usize,
    /// Upper bound on a single language-model call.
    pub lm_timeout_ms: u64,
    /// Output preference given to new sessions.
    pub output_mode: OutputMode,
    /// Longest accepted user message, in characters.
    pub max_message_chars: usize,
    /// Idle minutes before a session expires; 0 disables expiry.
    pub session_timeout_minutes: u32,
    /// Seconds between expiry sweeps.
    pub sweep_interval_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.6,
            context_window_turns: 20,
            lm_timeout_ms: 30_000,
            output_mode: OutputMode::TextOnly,
            max_message_chars: 2000,
            session_timeout_minutes: 60,
            sweep_interval_secs: 300,
        }
    }
}

/// Hosted language-model provider.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LmProvider {
    /// Google Gemini `generateContent` API.
    #[default]
    Gemini,
    /// Any OpenAI-compatible `/v1/chat/completions` API.
    OpenAi,
}

impl LmProvider {
    /// Environment variable holding this provider's API key.
    pub fn api_key_var(self) -> &'static str {
        match self {
            LmProvider::Gemini => "GOOGLE_API_KEY",
            LmProvider::OpenAi => "OPENAI_API_KEY",
        }
    }

    /// Base URL used when none is configured.
    pub fn default_base_url(self) -> &'static str {
        match self {
            LmProvider::Gemini => "https://generativelanguage.googleapis.com",
            LmProvider::OpenAi => "https://api.openai.com",
        }
    }
}

impl FromStr for LmProvider {
    type Err = VoxchatError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(LmProvider::Gemini),
            "openai" | "open_ai" | "openai-compatible" => Ok(LmProvider::OpenAi),
            other => Err(VoxchatError::Config(format!(
                "unknown LM provider '{}': expected gemini or openai",
                other
            ))),
        }
    }
}

/// Language-model collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LmConfig {
    pub provider: LmProvider,
    /// Model identifier passed to the provider.
    pub model: String,
    /// Override for the provider endpoint (proxies, local gateways, tests).
    pub base_url: Option<String>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Instruction sent ahead of the conversation.
    pub system_prompt: String,
    /// Provider API key. Read from the environment, never saved.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl LmConfig {
    /// Configured base URL or the provider default, without trailing slash.
    pub fn resolved_base_url(&self) -> String {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
            .trim_end_matches('/')
            .to_string()
    }
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            provider: LmProvider::Gemini,
            model: "gemini-1.5-flash".to_string(),
            base_url: None,
            temperature: 0.7,
            system_prompt: "You are a helpful AI assistant. Respond concisely and naturally."
                .to_string(),
            api_key: None,
        }
    }
}

/// Speech-recognition and TTS collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Recognition endpoint; voice input is unavailable when unset.
    pub stt_url: Option<String>,
    /// Synthesis endpoint; audio output degrades to text when unset.
    pub tts_url: Option<String>,
    /// Speaking rate in words per minute.
    pub tts_rate: u32,
    /// Output volume in `[0, 1]`.
    pub tts_volume: f32,
    /// Per-request timeout for both engines.
    pub request_timeout_ms: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            stt_url: None,
            tts_url: None,
            tts_rate: 150,
            tts_volume: 0.9,
            request_timeout_ms: 15_000,
        }
    }
}
