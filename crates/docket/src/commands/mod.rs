//! CLI command handlers.
//!
//! Each handler builds what it needs from [`Context`] once and then works
//! through the domain services. Nothing is cached between commands.

pub mod ask;
pub mod meetings;
pub mod process;
pub mod serve;
pub mod status;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result, anyhow};
use docket_channel::{SharedChannel, SignalChannel, SignalConfig, TelegramChannel, TelegramConfig};
use docket_config::{ChannelKind, ConfigSource, DocketConfig, IndexBackendKind, LoadedConfig};
use docket_domain::{DomainConfig, Services};
use docket_index::{ChromaBackend, IndexBackend, MemoryIndexBackend, SemanticIndex};
use docket_llm::{Gateway, OllamaBackend, OllamaConfig};
use docket_reminders::{CalendarBuilder, ReminderArtifact, ReminderPolicy};
use docket_store::SqliteStore;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Fully merged configuration.
    pub config: DocketConfig,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

/// Write reminder files into `dir`, creating it if needed.
pub fn write_artifacts(dir: &Path, artifacts: &[ReminderArtifact]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let path = dir.join(&artifact.filename);
        std::fs::write(&path, &artifact.content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

/// Load configuration from an explicit file, or by discovery.
///
/// Environment overrides apply in both cases.
pub fn load_config(path: Option<&Path>) -> Result<LoadedConfig> {
    let Some(path) = path else {
        return Ok(docket_config::load_config(None)?);
    };

    let mut config = docket_config::load_config_file(path)?;
    let mut warnings = Vec::new();
    let env_overrides = docket_config::apply_env_overrides(
        &mut config,
        |key| std::env::var(key).ok(),
        &mut warnings,
    );
    Ok(LoadedConfig {
        config,
        sources: vec![ConfigSource {
            path: path.to_path_buf(),
            loaded: true,
        }],
        env_overrides,
        warnings,
    })
}

impl Context {
    pub fn gateway(&self) -> Result<Gateway> {
        let llm = self.config.llm();
        let backend = OllamaBackend::new(OllamaConfig {
            base_url: llm.base_url.clone(),
            model: llm.model.clone(),
            embedding_model: llm.embedding_model.clone(),
            timeout: llm.timeout(),
            connect_timeout: llm.connect_timeout(),
            pull_timeout: llm.pull_timeout(),
            temperature: llm.temperature,
            top_p: llm.top_p,
            top_k: llm.top_k,
        })?;
        Ok(Gateway::new(Arc::new(backend)))
    }

    /// The configured index. The memory backend lives only as long as
    /// this process.
    pub fn index(&self) -> Result<SemanticIndex> {
        let section = self.config.index();
        let backend: Arc<dyn IndexBackend> = match section.backend {
            IndexBackendKind::Memory => Arc::new(MemoryIndexBackend::new()),
            IndexBackendKind::Chroma => Arc::new(ChromaBackend::new(section.url.clone())?),
        };
        Ok(SemanticIndex::new(backend).with_snippet_chars(section.snippet_chars))
    }

    pub fn store(&self) -> Result<Arc<SqliteStore>> {
        let path = self.config.storage().db_path();
        Ok(Arc::new(SqliteStore::open(&path)?))
    }

    /// Build the service context used by the pipeline, questions and the loop.
    pub fn services(&self) -> Result<Services> {
        let reminders = self.config.reminders();
        let policy = ReminderPolicy::new(reminders.default_minutes, reminders.travel_buffer_minutes);
        let domain = DomainConfig {
            escalate_deadlines: reminders.escalate_deadlines,
            send_delay: self.config.channel().send_delay(),
            context_results: self.config.index().context_results,
        };

        Ok(Services::new(self.gateway()?, self.index()?, self.store()?)
            .with_calendar(CalendarBuilder::new(policy))
            .with_config(domain))
    }

    /// The messaging channel, from `kind` or the configured default.
    pub fn channel(&self, kind: Option<ChannelKind>) -> Result<SharedChannel> {
        let section = self.config.channel();
        let kind = kind
            .or(section.kind)
            .ok_or_else(|| anyhow!("No channel configured. Set [channel] kind or pass --channel"))?;

        let channel: SharedChannel = match kind {
            ChannelKind::Signal => {
                let signal = section.require_signal()?;
                let config = SignalConfig::new(signal.phone_number.unwrap_or_default())
                    .with_cli_path(signal.cli_path);
                Arc::new(SignalChannel::new(config)?)
            }
            ChannelKind::Telegram => {
                let telegram = section.require_telegram()?;
                let config = TelegramConfig::new(
                    telegram.bot_token.unwrap_or_default(),
                    telegram.chat_id.unwrap_or_default(),
                )
                .with_api_base(telegram.api_base);
                Arc::new(TelegramChannel::new(config)?)
            }
        };
        Ok(channel)
    }
}
