//! Row model for the `groupme_messages` table.

use gbot_core::{Message, MessageDirection, StorageError};
use serde::{Deserialize, Serialize};

use crate::error::serialization;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredMessage {
    pub id: String,
    pub group_id: String,
    pub user_id: String,
    pub text: Option<String>,
    /// Epoch seconds.
    pub created_at: i64,
    pub direction: String,
    pub raw_json: String,
}

impl StoredMessage {
    pub fn direction(&self) -> Option<MessageDirection> {
        self.direction.parse().ok()
    }

    /// Rebuilds the message from its stored payload.
    pub fn to_message(&self) -> Result<Message, StorageError> {
        let raw = serde_json::from_str(&self.raw_json).map_err(serialization)?;
        Message::from_payload(raw).map_err(serialization)
    }
}
