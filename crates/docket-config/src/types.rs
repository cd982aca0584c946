//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [llm]                 # Ollama endpoint and sampling
//! [index]               # semantic index backend
//! [storage]             # SQLite database location
//! [reminders]           # lead times
//! [channel]             # which messenger, plus [channel.signal] / [channel.telegram]
//! [ingest]              # polling cadence
//! [logging]             # log files
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Built-in defaults.
pub mod defaults {
    pub const OLLAMA_URL: &str = "http://localhost:11434";
    pub const MODEL: &str = "qwen2.5:14b";
    pub const CHROMA_URL: &str = "http://localhost:8000";
    pub const TELEGRAM_API: &str = "https://api.telegram.org";
    pub const SIGNAL_CLI: &str = "signal-cli";
    pub const DB_FILE: &str = "docket.db";
}

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged. Accessors fill in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocketConfig {
    pub llm: Option<LlmSection>,
    pub index: Option<IndexSection>,
    pub storage: Option<StorageSection>,
    pub reminders: Option<RemindersSection>,
    pub channel: Option<ChannelSection>,
    pub ingest: Option<IngestSection>,
    pub logging: Option<LoggingSection>,
}

impl DocketConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Sections are replaced whole, not field by field.
    pub fn merge(&mut self, other: DocketConfig) {
        if other.llm.is_some() {
            self.llm = other.llm;
        }
        if other.index.is_some() {
            self.index = other.index;
        }
        if other.storage.is_some() {
            self.storage = other.storage;
        }
        if other.reminders.is_some() {
            self.reminders = other.reminders;
        }
        if other.channel.is_some() {
            self.channel = other.channel;
        }
        if other.ingest.is_some() {
            self.ingest = other.ingest;
        }
        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    pub fn llm(&self) -> LlmSection {
        self.llm.clone().unwrap_or_default()
    }

    pub fn index(&self) -> IndexSection {
        self.index.clone().unwrap_or_default()
    }

    pub fn storage(&self) -> StorageSection {
        self.storage.clone().unwrap_or_default()
    }

    pub fn reminders(&self) -> RemindersSection {
        self.reminders.clone().unwrap_or_default()
    }

    pub fn channel(&self) -> ChannelSection {
        self.channel.clone().unwrap_or_default()
    }

    pub fn ingest(&self) -> IngestSection {
        self.ingest.clone().unwrap_or_default()
    }

    pub fn logging(&self) -> LoggingSection {
        self.logging.clone().unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LLM
// ─────────────────────────────────────────────────────────────────────────────

/// Language model backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub base_url: String,
    pub model: String,
    /// Separate embedding model; the chat model is used when unset.
    pub embedding_model: Option<String>,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Allowance for downloading a missing model.
    pub pull_timeout_secs: u64,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    /// Check (and pull) the model at start-up.
    pub verify_model: bool,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: defaults::OLLAMA_URL.to_string(),
            model: defaults::MODEL.to_string(),
            embedding_model: None,
            timeout_secs: 60,
            connect_timeout_secs: 10,
            pull_timeout_secs: 300,
            temperature: 0.7,
            top_p: 0.9,
            top_k: 40,
            verify_model: true,
        }
    }
}

impl LlmSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn pull_timeout(&self) -> Duration {
        Duration::from_secs(self.pull_timeout_secs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Index
// ─────────────────────────────────────────────────────────────────────────────

/// Which semantic index backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackendKind {
    /// In-process index, lost on restart.
    #[default]
    Memory,
    /// Chroma server over HTTP.
    Chroma,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSection {
    pub backend: IndexBackendKind,
    pub url: String,
    /// Results folded into question-answering context.
    pub context_results: usize,
    /// Per-result character cap in that context.
    pub snippet_chars: usize,
}

impl Default for IndexSection {
    fn default() -> Self {
        Self {
            backend: IndexBackendKind::Memory,
            url: defaults::CHROMA_URL.to_string(),
            context_results: 3,
            snippet_chars: 500,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Storage
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Database file; defaults to `<data dir>/docket/docket.db`.
    pub path: Option<PathBuf>,
}

impl StorageSection {
    /// Resolved database path.
    pub fn db_path(&self) -> PathBuf {
        self.path
            .clone()
            .or_else(|| crate::discovery::default_data_dir().map(|d| d.join(defaults::DB_FILE)))
            .unwrap_or_else(|| PathBuf::from(defaults::DB_FILE))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Reminders
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemindersSection {
    /// Lead time for medium priority items.
    pub default_minutes: u32,
    /// Added when an item requires travel.
    pub travel_buffer_minutes: u32,
    /// Use multi-alert deadline reminders for high/urgent items.
    pub escalate_deadlines: bool,
}

impl Default for RemindersSection {
    fn default() -> Self {
        Self {
            default_minutes: 15,
            travel_buffer_minutes: 30,
            escalate_deadlines: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Channel
// ─────────────────────────────────────────────────────────────────────────────

/// Messaging backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Signal,
    Telegram,
}

impl std::str::FromStr for ChannelKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "signal" => Ok(Self::Signal),
            "telegram" => Ok(Self::Telegram),
            other => Err(ConfigError::InvalidValue {
                field: "channel.kind".to_string(),
                message: format!("unknown channel '{}'", other),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSection {
    pub kind: Option<ChannelKind>,
    /// Pause between consecutive outbound sends.
    pub send_delay_ms: u64,
    pub signal: Option<SignalSection>,
    pub telegram: Option<TelegramSection>,
}

impl Default for ChannelSection {
    fn default() -> Self {
        Self {
            kind: None,
            send_delay_ms: 500,
            signal: None,
            telegram: None,
        }
    }
}

impl ChannelSection {
    pub fn send_delay(&self) -> Duration {
        Duration::from_millis(self.send_delay_ms)
    }

    /// Signal settings, failing when the phone number is missing.
    pub fn require_signal(&self) -> Result<SignalSection> {
        let signal = self.signal.clone().unwrap_or_default();
        if signal.phone_number.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::MissingField {
                field: "phone_number".to_string(),
                context: "[channel.signal]".to_string(),
            });
        }
        Ok(signal)
    }

    /// Telegram settings, failing when token or chat id is missing.
    pub fn require_telegram(&self) -> Result<TelegramSection> {
        let telegram = self.telegram.clone().unwrap_or_default();
        for (field, value) in [
            ("bot_token", &telegram.bot_token),
            ("chat_id", &telegram.chat_id),
        ] {
            if value.as_deref().is_none_or(str::is_empty) {
                return Err(ConfigError::MissingField {
                    field: field.to_string(),
                    context: "[channel.telegram]".to_string(),
                });
            }
        }
        Ok(telegram)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalSection {
    pub cli_path: PathBuf,
    pub phone_number: Option<String>,
}

impl Default for SignalSection {
    fn default() -> Self {
        Self {
            cli_path: PathBuf::from(defaults::SIGNAL_CLI),
            phone_number: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramSection {
    pub bot_token: Option<String>,
    /// Quoted in TOML; group ids are negative.
    pub chat_id: Option<String>,
    pub api_base: String,
}

impl Default for TelegramSection {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base: defaults::TELEGRAM_API.to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Ingest
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSection {
    /// Wait after an empty or completed poll.
    pub poll_interval_secs: u64,
    /// Wait after a failed poll.
    pub error_backoff_secs: u64,
    /// Send a capability greeting when the loop starts.
    pub greet_on_start: bool,
}

impl Default for IngestSection {
    fn default() -> Self {
        Self {
            poll_interval_secs: 2,
            error_backoff_secs: 5,
            greet_on_start: true,
        }
    }
}

impl IngestSection {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Write JSON log files in addition to console output.
    pub file: bool,
    /// Log directory; defaults to `<config dir>/logs`.
    pub dir: Option<PathBuf>,
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: Option<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            file: true,
            dir: None,
            level: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_defaults() {
        let config = DocketConfig::from_toml("").unwrap();
        assert!(config.llm.is_none());

        let llm = config.llm();
        assert_eq!(llm.base_url, defaults::OLLAMA_URL);
        assert_eq!(llm.model, defaults::MODEL);
        assert_eq!(llm.pull_timeout(), Duration::from_secs(300));
        assert!(llm.verify_model);

        assert_eq!(config.index().backend, IndexBackendKind::Memory);
        assert_eq!(config.index().context_results, 3);
        assert_eq!(config.reminders().default_minutes, 15);
        assert_eq!(config.reminders().travel_buffer_minutes, 30);
        assert_eq!(config.channel().send_delay(), Duration::from_millis(500));
        assert_eq!(config.ingest().error_backoff(), Duration::from_secs(5));
        assert!(config.storage().db_path().ends_with("docket.db"));
    }

    #[test]
    fn test_partial_section_fills_defaults() {
        let config = DocketConfig::from_toml(
            r#"
[llm]
model = "llama3.1:8b"

[index]
backend = "chroma"
url = "http://chroma:8000"

[channel]
kind = "telegram"

[channel.telegram]
bot_token = "123:abc"
chat_id = "-1001"
"#,
        )
        .unwrap();

        let llm = config.llm();
        assert_eq!(llm.model, "llama3.1:8b");
        assert_eq!(llm.base_url, defaults::OLLAMA_URL);
        assert_eq!(config.index().backend, IndexBackendKind::Chroma);

        let channel = config.channel();
        assert_eq!(channel.kind, Some(ChannelKind::Telegram));
        let telegram = channel.require_telegram().unwrap();
        assert_eq!(telegram.chat_id.as_deref(), Some("-1001"));
        assert_eq!(telegram.api_base, defaults::TELEGRAM_API);
    }

    #[test]
    fn test_require_signal_phone() {
        let err = ChannelSection::default().require_signal().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { ref field, .. } if field == "phone_number"));
    }

    #[test]
    fn test_merge_replaces_sections() {
        let mut base = DocketConfig::from_toml("[reminders]\ndefault_minutes = 20\n").unwrap();
        let overlay = DocketConfig::from_toml("[ingest]\npoll_interval_secs = 9\n").unwrap();
        base.merge(overlay);

        assert_eq!(base.reminders().default_minutes, 20);
        assert_eq!(base.ingest().poll_interval_secs, 9);
    }

    #[test]
    fn test_channel_kind_from_str() {
        assert_eq!("Signal".parse::<ChannelKind>().unwrap(), ChannelKind::Signal);
        assert!("carrier-pigeon".parse::<ChannelKind>().is_err());
    }
}
