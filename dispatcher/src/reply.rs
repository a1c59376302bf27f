//! Reply capability handed to handlers.

use std::sync::Arc;

use gbot_core::{
    MessageStore, OutgoingMessage, SendError, SendReceipt, Sender, SentMessage,
};
use tracing::{debug, instrument, warn};

/// Sends messages as the bot that received the current message.
///
/// Replying and sending a new message are the same operation. When a store and group id are
/// attached, every successful send is recorded; recording failures are logged and swallowed.
#[derive(Clone)]
pub struct ReplyHandle {
    sender: Arc<dyn Sender>,
    store: Option<Arc<dyn MessageStore>>,
    group_id: Option<String>,
}

impl ReplyHandle {
    pub fn new(sender: Arc<dyn Sender>) -> Self {
        Self {
            sender,
            store: None,
            group_id: None,
        }
    }

    /// Records sent messages into `store` under `group_id`.
    pub fn with_store(mut self, store: Arc<dyn MessageStore>, group_id: impl Into<String>) -> Self {
        self.store = Some(store);
        self.group_id = Some(group_id.into());
        self
    }

    pub fn bot_id(&self) -> &str {
        self.sender.bot_id()
    }

    pub fn group_id(&self) -> Option<&str> {
        self.group_id.as_deref()
    }

    /// The store sent messages are recorded into, if any.
    pub fn store(&self) -> Option<&Arc<dyn MessageStore>> {
        self.store.as_ref()
    }

    #[instrument(skip(self, message), fields(bot_id = %self.sender.bot_id()))]
    pub async fn send(&self, message: &OutgoingMessage) -> Result<SendReceipt, SendError> {
        let receipt = self.sender.send(message).await?;
        debug!(status = receipt.status, text_len = message.text.len(), "reply sent");
        self.record_sent(message).await;
        Ok(receipt)
    }

    pub async fn text(&self, text: impl Into<String>) -> Result<SendReceipt, SendError> {
        self.send(&OutgoingMessage::text(text)).await
    }

    pub async fn image(
        &self,
        text: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Result<SendReceipt, SendError> {
        self.send(&OutgoingMessage::text(text).with_image(image_url))
            .await
    }

    pub async fn location(
        &self,
        name: impl Into<String>,
        lat: f64,
        lng: f64,
        text: impl Into<String>,
    ) -> Result<SendReceipt, SendError> {
        self.send(&OutgoingMessage::location(name, lat, lng, text))
            .await
    }

    async fn record_sent(&self, message: &OutgoingMessage) {
        let (Some(store), Some(group_id)) = (&self.store, &self.group_id) else {
            return;
        };
        let sent = SentMessage {
            text: message.text.clone(),
            group_id: group_id.clone(),
            sender_id: self.sender.bot_id().to_string(),
            image_url: message.image_url.clone(),
        };
        if let Err(e) = store.record_sent(&sent).await {
            warn!(group_id = %group_id, error = %e, "Failed to record sent message");
        }
    }
}
