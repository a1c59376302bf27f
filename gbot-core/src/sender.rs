//! Outbound capability: posting messages as a bot identity.
//!
//! [`Sender`] is transport-agnostic; `groupme-client` implements it over HTTP.

use async_trait::async_trait;

use crate::error::SendError;
use crate::outgoing::{OutgoingMessage, SendReceipt};

/// Posts messages to the chat platform as one bot identity.
#[async_trait]
pub trait Sender: Send + Sync {
    /// Identity this sender posts as.
    fn bot_id(&self) -> &str;

    /// Delivers one message. Failures are returned, never retried.
    async fn send(&self, message: &OutgoingMessage) -> Result<SendReceipt, SendError>;
}
