//! Outbound messages and delivery receipts.

use serde::{Deserialize, Serialize};

use crate::attachment::Attachment;

/// A message the bot posts to its group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub text: String,
    pub image_url: Option<String>,
    pub attachments: Vec<Attachment>,
}

impl OutgoingMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// A shared location. Empty `text` falls back to the location name.
    pub fn location(name: impl Into<String>, lat: f64, lng: f64, text: impl Into<String>) -> Self {
        let name = name.into();
        let text = text.into();
        let text = if text.is_empty() { name.clone() } else { text };
        Self::text(text).with_attachment(Attachment::location(name, lat, lng))
    }
}

/// Acknowledgement of a successful post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    /// Identity the message was posted as.
    pub bot_id: String,
    /// HTTP status returned by the platform.
    pub status: u16,
}
