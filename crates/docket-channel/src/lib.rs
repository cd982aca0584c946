//! Message channels for Docket.
//!
//! A channel is anything that can send text, send a file with an optional
//! caption, and hand back messages received since the previous call. The
//! ingestion loop and the meeting pipeline only ever see [`MessageChannel`].
//!
//! Implementations:
//! - [`SignalChannel`]: drives a local `signal-cli` install ("Note to Self")
//! - [`TelegramChannel`]: Telegram Bot API through teloxide long polling
//! - [`MockChannel`]: scripted inbound batches, captured outbound traffic

pub mod channel;
pub mod error;
pub mod mock;
pub mod signal;
pub mod telegram;

pub use channel::{InboundMessage, MessageChannel, OutboundFile, SharedChannel};
pub use error::{ChannelError, Result};
pub use mock::{MockChannel, SentItem};
pub use signal::{SignalChannel, SignalConfig};
pub use telegram::{TelegramChannel, TelegramConfig};
