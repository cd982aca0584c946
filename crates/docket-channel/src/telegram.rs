//! Telegram channel built on teloxide.
//!
//! A background dispatcher long-polls the Bot API and queues text messages
//! from the configured chat. `receive` drains whatever has been queued since
//! the previous call, so the ingestion loop keeps its own poll cadence. Each
//! inbound message's timestamp is its Telegram message id, which only grows
//! within a chat.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Url;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InputFile, Recipient};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::channel::{InboundMessage, MessageChannel, OutboundFile};
use crate::error::{ChannelError, Result};

/// Default Telegram Bot API base.
pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";

/// Messages buffered between two `receive` calls.
const INBOUND_BUFFER: usize = 100;

/// Configuration for the Telegram channel.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub api_base: String,
    pub bot_token: String,
    /// Chat the bot talks to; inbound messages from other chats are ignored.
    pub chat_id: String,
    pub timeout: Duration,
}

impl TelegramConfig {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_TELEGRAM_API.to_string(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Telegram Channel
// ─────────────────────────────────────────────────────────────────────────────

/// Telegram bot channel bound to one chat.
pub struct TelegramChannel {
    bot: Bot,
    config: TelegramConfig,
    chat: ChatId,
    inbound_tx: mpsc::Sender<InboundMessage>,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundMessage>>,
    polling: Mutex<Option<JoinHandle<()>>>,
}

impl TelegramChannel {
    pub fn new(config: TelegramConfig) -> Result<Self> {
        if config.bot_token.trim().is_empty() {
            return Err(ChannelError::Config(
                "Telegram bot token is not set".to_string(),
            ));
        }
        let chat = parse_chat_id(&config.chat_id)?;
        let api_url = Url::parse(&config.api_base).map_err(|e| {
            ChannelError::Config(format!("Invalid Telegram API base {}: {}", config.api_base, e))
        })?;

        let client = teloxide::net::default_reqwest_settings()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ChannelError::Config(format!("Failed to create HTTP client: {}", e)))?;
        let bot = Bot::with_client(config.bot_token.clone(), client).set_api_url(api_url);
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_BUFFER);

        Ok(Self {
            bot,
            config,
            chat,
            inbound_tx,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            polling: Mutex::new(None),
        })
    }

    /// The underlying teloxide bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// Start long polling unless it is already running.
    ///
    /// Fails when an earlier polling task has exited.
    fn ensure_polling(&self) -> Result<()> {
        let mut polling = self.polling.lock();
        if let Some(handle) = polling.as_ref() {
            if handle.is_finished() {
                return Err(ChannelError::Unavailable(
                    "Telegram polling stopped".to_string(),
                ));
            }
            return Ok(());
        }

        let bot = self.bot.clone();
        let tx = self.inbound_tx.clone();
        let chat = self.chat;
        info!(chat_id = chat.0, "Starting Telegram long polling");

        *polling = Some(tokio::spawn(async move {
            let handler = Update::filter_message()
                .filter(move |msg: Message| msg.chat.id == chat)
                .endpoint(move |msg: Message| {
                    let tx = tx.clone();
                    async move {
                        match to_inbound(&msg) {
                            Some(inbound) => {
                                if tx.send(inbound).await.is_err() {
                                    warn!("Telegram inbound queue closed, dropping message");
                                }
                            }
                            None => debug!(msg_id = msg.id.0, "Ignoring non-text message"),
                        }
                        respond(())
                    }
                });

            Dispatcher::builder(bot, handler)
                .default_handler(|_| async {})
                .build()
                .dispatch()
                .await;
        }));
        Ok(())
    }
}

impl Drop for TelegramChannel {
    fn drop(&mut self) {
        if let Some(handle) = self.polling.lock().take() {
            handle.abort();
        }
    }
}

/// Parse a configured chat id. Group ids are negative.
pub fn parse_chat_id(raw: &str) -> Result<ChatId> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ChannelError::Config(
            "Telegram chat id is not set".to_string(),
        ));
    }
    raw.parse::<i64>()
        .map(ChatId)
        .map_err(|_| ChannelError::Config(format!("Invalid Telegram chat id: {raw}")))
}

/// Text messages become inbound messages; anything else is skipped.
pub fn to_inbound(msg: &Message) -> Option<InboundMessage> {
    let text = msg.text()?;
    Some(InboundMessage::new(text, i64::from(msg.id.0)))
}

#[async_trait]
impl MessageChannel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn chat_id(&self) -> &str {
        &self.config.chat_id
    }

    async fn send_text(&self, text: &str) -> Result<()> {
        self.bot
            .send_message(Recipient::Id(self.chat), text)
            .await?;
        debug!(chat_id = self.chat.0, "Message sent");
        Ok(())
    }

    async fn send_file(&self, file: &OutboundFile, caption: Option<&str>) -> Result<()> {
        let document = InputFile::memory(file.content.clone()).file_name(file.filename.clone());
        let mut request = self.bot.send_document(Recipient::Id(self.chat), document);
        if let Some(caption) = caption {
            request = request.caption(caption);
        }
        request.await?;
        debug!(chat_id = self.chat.0, filename = %file.filename, "Document sent");
        Ok(())
    }

    async fn receive(&self) -> Result<Vec<InboundMessage>> {
        self.ensure_polling()?;

        let mut rx = self.inbound_rx.lock().await;
        let mut messages = Vec::new();
        while let Ok(message) = rx.try_recv() {
            messages.push(message);
        }

        if !messages.is_empty() {
            debug!(count = messages.len(), "Received Telegram messages");
        }
        Ok(messages)
    }

    async fn health_check(&self) -> Result<()> {
        let me = self.bot.get_me().await?;
        info!(
            bot = me.user.username.as_deref().unwrap_or("unknown"),
            "Telegram bot reachable"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message(chat_id: i64, message_id: i32, text: &str) -> Message {
        let value = json!({
            "message_id": message_id,
            "date": 1700000000i64,
            "chat": {
                "id": chat_id,
                "type": "private",
                "first_name": "Test",
            },
            "from": {
                "id": chat_id,
                "is_bot": false,
                "first_name": "Test",
            },
            "text": text,
        });
        serde_json::from_value(value).unwrap()
    }

    fn sent_message() -> serde_json::Value {
        json!({
            "ok": true,
            "result": {
                "message_id": 5,
                "date": 1700000000i64,
                "chat": {"id": 42, "type": "private", "first_name": "Test"},
                "text": "ok"
            }
        })
    }

    fn channel(server: &MockServer) -> TelegramChannel {
        TelegramChannel::new(TelegramConfig::new("TOKEN", "42").with_api_base(server.uri()))
            .unwrap()
    }

    #[test]
    fn test_to_inbound_uses_message_id() {
        let msg = message(42, 17, "meeting notes");
        assert_eq!(to_inbound(&msg), Some(InboundMessage::new("meeting notes", 17)));
    }

    #[test]
    fn test_parse_chat_id() {
        assert_eq!(parse_chat_id("42").unwrap(), ChatId(42));
        assert_eq!(parse_chat_id(" -1001 ").unwrap(), ChatId(-1001));
        assert!(parse_chat_id("").is_err());
        assert!(parse_chat_id("@someone").is_err());
    }

    #[test]
    fn test_requires_token_and_chat() {
        assert!(TelegramChannel::new(TelegramConfig::new("", "1")).is_err());
        assert!(TelegramChannel::new(TelegramConfig::new("t", "")).is_err());
        assert!(
            TelegramChannel::new(TelegramConfig::new("t", "1").with_api_base("not a url"))
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_send_text_targets_configured_chat() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex("(?i)^/botTOKEN/sendmessage$"))
            .and(body_partial_json(json!({"chat_id": 42, "text": "hi"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(sent_message()))
            .expect(1)
            .mount(&server)
            .await;

        channel(&server).send_text("hi").await.unwrap();
    }

    #[tokio::test]
    async fn test_send_file_uploads_document() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex("(?i)^/botTOKEN/senddocument$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sent_message()))
            .expect(1)
            .mount(&server)
            .await;

        let file = OutboundFile::new("a.ics", "BEGIN:VCALENDAR");
        channel(&server)
            .send_file(&file, Some("calendar"))
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains("a.ics"));
        assert!(body.contains("BEGIN:VCALENDAR"));
        assert!(body.contains("calendar"));
    }

    #[tokio::test]
    async fn test_api_error_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex("(?i)^/botTOKEN/sendmessage$"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found"
            })))
            .mount(&server)
            .await;

        let err = channel(&server).send_text("hi").await.unwrap_err();
        assert!(matches!(err, ChannelError::Api { .. }), "{err:?}");
    }
}
