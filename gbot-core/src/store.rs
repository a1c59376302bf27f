//! Persistence capability used by the dispatcher and reply handles.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::types::Message;

/// A message the bot posted, as handed to [`MessageStore::record_sent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub text: String,
    pub group_id: String,
    /// Bot id the message was posted as.
    pub sender_id: String,
    pub image_url: Option<String>,
}

/// Message history. Implementations synchronise internally; every call is independent.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Records an inbound message. Recording the same id twice is not an error.
    async fn record_received(&self, message: &Message) -> Result<(), StorageError>;

    async fn record_sent(&self, message: &SentMessage) -> Result<(), StorageError>;

    /// Most recent messages of a group, newest first.
    async fn recent(&self, group_id: &str, limit: u32) -> Result<Vec<Message>, StorageError>;
}
