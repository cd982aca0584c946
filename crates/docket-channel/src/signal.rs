//! Signal channel backed by a local `signal-cli` install.
//!
//! Messages are exchanged with the account's own "Note to Self" thread:
//! outbound calls send to the configured number, and `receive` keeps only
//! messages whose envelope source is that same number.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::channel::{InboundMessage, MessageChannel, OutboundFile};
use crate::error::{ChannelError, Result};

/// Default signal-cli binary name.
pub const DEFAULT_SIGNAL_CLI: &str = "signal-cli";

/// Configuration for the Signal channel.
#[derive(Debug, Clone)]
pub struct SignalConfig {
    /// Path to the signal-cli binary.
    pub cli_path: PathBuf,
    /// Registered account number, also the Note to Self recipient.
    pub phone_number: String,
    /// Per-invocation timeout.
    pub timeout: Duration,
}

impl SignalConfig {
    pub fn new(phone_number: impl Into<String>) -> Self {
        Self {
            cli_path: PathBuf::from(DEFAULT_SIGNAL_CLI),
            phone_number: phone_number.into(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_cli_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cli_path = path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Signal "Note to Self" channel.
#[derive(Debug, Clone)]
pub struct SignalChannel {
    config: SignalConfig,
}

impl SignalChannel {
    pub fn new(config: SignalConfig) -> Result<Self> {
        if config.phone_number.trim().is_empty() {
            return Err(ChannelError::Config(
                "Signal phone number is not set".to_string(),
            ));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    /// Run signal-cli against the configured account and return stdout.
    async fn run(&self, args: &[&str]) -> Result<String> {
        let child = Command::new(&self.config.cli_path)
            .arg("-a")
            .arg(&self.config.phone_number)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ChannelError::Unavailable(format!(
                    "failed to spawn {}: {}",
                    self.config.cli_path.display(),
                    e
                ))
            })?;

        let output = match tokio::time::timeout(self.config.timeout, child.wait_with_output()).await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(ChannelError::Io(e)),
            Err(_) => {
                return Err(ChannelError::Command(format!(
                    "signal-cli timed out after {}s",
                    self.config.timeout.as_secs()
                )));
            }
        };

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(ChannelError::Command(stderr.trim().to_string()))
        }
    }
}

#[async_trait]
impl MessageChannel for SignalChannel {
    fn name(&self) -> &str {
        "signal"
    }

    fn chat_id(&self) -> &str {
        &self.config.phone_number
    }

    async fn send_text(&self, text: &str) -> Result<()> {
        self.run(&["send", self.config.phone_number.as_str(), "-m", text])
            .await?;
        debug!("Message sent to Note to Self");
        Ok(())
    }

    async fn send_file(&self, file: &OutboundFile, caption: Option<&str>) -> Result<()> {
        // signal-cli names the attachment after the file on disk.
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(&file.filename);
        tokio::fs::write(&path, &file.content).await?;
        let path = path.to_string_lossy().into_owned();

        let mut args = vec!["send", self.config.phone_number.as_str(), "-a", path.as_str()];
        if let Some(caption) = caption {
            args.extend(["-m", caption]);
        }
        self.run(&args).await?;

        debug!(filename = %file.filename, "File sent to Note to Self");
        Ok(())
    }

    async fn receive(&self) -> Result<Vec<InboundMessage>> {
        let stdout = self.run(&["receive", "--json"]).await?;
        Ok(parse_receive_output(&stdout, &self.config.phone_number))
    }

    async fn health_check(&self) -> Result<()> {
        let cli = &self.config.cli_path;
        if cli.components().count() > 1 && !cli.exists() {
            return Err(ChannelError::Unavailable(format!(
                "signal-cli not found at {}",
                cli.display()
            )));
        }
        self.run(&["listIdentities"]).await?;
        info!("Signal CLI is configured and ready");
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Receive output parsing
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ReceiveLine {
    envelope: Envelope,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    source: Option<String>,
    source_number: Option<String>,
    #[serde(default)]
    timestamp: i64,
    data_message: Option<DataMessage>,
    sync_message: Option<SyncMessage>,
}

#[derive(Debug, Deserialize)]
struct DataMessage {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyncMessage {
    sent_message: Option<DataMessage>,
}

/// Parse `signal-cli receive --json` output (one JSON object per line),
/// keeping text messages the account sent to itself.
pub fn parse_receive_output(stdout: &str, own_number: &str) -> Vec<InboundMessage> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<ReceiveLine>(line) {
            Ok(parsed) => Some(parsed.envelope),
            Err(e) => {
                warn!(error = %e, "Skipping unparseable signal-cli line");
                None
            }
        })
        .filter(|env| {
            env.source.as_deref() == Some(own_number)
                || env.source_number.as_deref() == Some(own_number)
        })
        .filter_map(|env| {
            let text = env
                .data_message
                .and_then(|m| m.message)
                .or_else(|| env.sync_message.and_then(|s| s.sent_message?.message))?;
            if text.trim().is_empty() {
                return None;
            }
            Some(InboundMessage::new(text, env.timestamp))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ME: &str = "+15550100";

    #[test]
    fn test_parse_keeps_note_to_self_messages() {
        let stdout = r#"
{"envelope":{"source":"+15550100","timestamp":1700000000000,"dataMessage":{"message":"hello"}}}
{"envelope":{"source":"+15550199","timestamp":1700000000001,"dataMessage":{"message":"spam"}}}
{"envelope":{"source":"+15550100","timestamp":1700000000002,"typingMessage":{}}}
not json at all
{"envelope":{"sourceNumber":"+15550100","timestamp":1700000000003,"syncMessage":{"sentMessage":{"message":"from phone"}}}}
"#;
        let messages = parse_receive_output(stdout, ME);
        assert_eq!(
            messages,
            vec![
                InboundMessage::new("hello", 1700000000000),
                InboundMessage::new("from phone", 1700000000003),
            ]
        );
    }

    #[test]
    fn test_parse_empty_output() {
        assert!(parse_receive_output("", ME).is_empty());
    }

    #[test]
    fn test_requires_phone_number() {
        assert!(matches!(
            SignalChannel::new(SignalConfig::new("  ")),
            Err(ChannelError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let channel = SignalChannel::new(
            SignalConfig::new(ME).with_cli_path("/nonexistent/bin/signal-cli"),
        )
        .unwrap();

        assert!(matches!(
            channel.health_check().await,
            Err(ChannelError::Unavailable(_))
        ));
        assert!(matches!(
            channel.receive().await,
            Err(ChannelError::Unavailable(_))
        ));
    }
}
