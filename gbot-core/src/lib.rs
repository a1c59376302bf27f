//! # gbot-core
//!
//! Core types and capability traits for the GroupMe bot: [`Message`], [`Attachment`],
//! [`OutgoingMessage`], the [`Sender`] and [`MessageStore`] traits, the error taxonomy,
//! and tracing initialization. Transport-agnostic; used by dispatcher, storage,
//! groupme-client and groupme-bot.

pub mod attachment;
pub mod error;
pub mod logger;
pub mod outgoing;
pub mod sender;
pub mod store;
pub mod types;

pub use attachment::{Attachment, Location};
pub use error::{
    ConfigurationError, GbotError, HandlerError, HandlerResult, Result, SendError, StorageError,
};
pub use logger::init_tracing;
pub use outgoing::{OutgoingMessage, SendReceipt};
pub use sender::Sender;
pub use store::{MessageStore, SentMessage};
pub use types::{Message, MessageDirection, SenderKind, COMMAND_MARKERS};
