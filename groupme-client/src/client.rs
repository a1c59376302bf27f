//! reqwest-backed [`Sender`] for the GroupMe bots API.

use async_trait::async_trait;
use gbot_core::{OutgoingMessage, SendError, SendReceipt, Sender};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;

/// Posts messages as one bot. Cheap to clone; clones and [`with_bot_id`](Self::with_bot_id)
/// derivatives share the HTTP connection pool.
#[derive(Clone)]
pub struct GroupMeClient {
    http: reqwest::Client,
    config: ClientConfig,
}

#[derive(Serialize)]
struct PostBody<'a> {
    bot_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    picture_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<Value>,
}

impl GroupMeClient {
    pub fn new(config: ClientConfig) -> Result<Self, SendError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SendError::Transport(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// A client for another bot identity on the same connection pool.
    pub fn with_bot_id(&self, bot_id: impl Into<String>) -> Self {
        Self {
            http: self.http.clone(),
            config: ClientConfig {
                bot_id: bot_id.into(),
                ..self.config.clone()
            },
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[instrument(skip(self, message), fields(bot_id = %self.config.bot_id))]
    async fn post(&self, message: &OutgoingMessage) -> Result<SendReceipt, SendError> {
        if self.config.bot_id.is_empty() {
            return Err(SendError::MissingBotId);
        }

        let body = PostBody {
            bot_id: &self.config.bot_id,
            text: &message.text,
            picture_url: message.image_url.as_deref(),
            attachments: message.attachments.iter().map(|a| a.to_value()).collect(),
        };

        let response = self
            .http
            .post(self.config.post_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "GroupMe rejected message");
            return Err(SendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = status.as_u16(), text_len = message.text.len(), "message posted");
        Ok(SendReceipt {
            bot_id: self.config.bot_id.clone(),
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl Sender for GroupMeClient {
    fn bot_id(&self) -> &str {
        &self.config.bot_id
    }

    async fn send(&self, message: &OutgoingMessage) -> Result<SendReceipt, SendError> {
        self.post(message).await
    }
}
