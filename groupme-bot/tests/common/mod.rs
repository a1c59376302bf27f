//! Shared helpers for groupme-bot integration tests: a recording Sender, config and payload
//! builders.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gbot_core::{OutgoingMessage, SendError, SendReceipt, Sender};
use groupme_bot::config::{DEFAULT_BIND_ADDR, DEFAULT_DATABASE_URL, DEFAULT_WEBHOOK_PATH};
use groupme_bot::BotConfig;
use groupme_client::DEFAULT_API_URL;
use serde_json::{json, Value};

pub const BOT_ID: &str = "bot-1";
pub const GROUP_ID: &str = "group-1";

pub struct RecordingSender {
    sent: Mutex<Vec<OutgoingMessage>>,
}

#[allow(dead_code)]
impl RecordingSender {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|m| m.text.clone()).collect()
    }

    /// Polls until at least `n` messages were sent or two seconds pass.
    pub async fn wait_for(&self, n: usize) -> Vec<String> {
        for _ in 0..100 {
            let texts = self.texts();
            if texts.len() >= n {
                return texts;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.texts()
    }
}

#[async_trait]
impl Sender for RecordingSender {
    fn bot_id(&self) -> &str {
        BOT_ID
    }

    async fn send(&self, message: &OutgoingMessage) -> Result<SendReceipt, SendError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(SendReceipt {
            bot_id: BOT_ID.to_string(),
            status: 202,
        })
    }
}

#[allow(dead_code)]
pub fn test_config(enable_storage: bool) -> BotConfig {
    BotConfig {
        api_key: "test-key".to_string(),
        bot_id: BOT_ID.to_string(),
        group_id: Some(GROUP_ID.to_string()),
        api_url: DEFAULT_API_URL.to_string(),
        bind_addr: DEFAULT_BIND_ADDR.to_string(),
        webhook_path: DEFAULT_WEBHOOK_PATH.to_string(),
        enable_storage,
        database_url: if enable_storage {
            "sqlite::memory:".to_string()
        } else {
            DEFAULT_DATABASE_URL.to_string()
        },
        log_file: None,
        handler_timeout: None,
        max_background_tasks: None,
    }
}

/// A user message in [`GROUP_ID`]. `name` doubles as the sender id.
#[allow(dead_code)]
pub fn user_payload(id: &str, name: &str, text: &str, created_at: i64) -> Value {
    json!({
        "id": id,
        "group_id": GROUP_ID,
        "sender_id": format!("u-{}", name.to_lowercase()),
        "user_id": format!("u-{}", name.to_lowercase()),
        "name": name,
        "sender_type": "user",
        "system": false,
        "text": text,
        "created_at": created_at,
        "attachments": []
    })
}

#[allow(dead_code)]
pub fn bot_payload(id: &str, text: &str) -> Value {
    json!({
        "id": id,
        "group_id": GROUP_ID,
        "sender_id": BOT_ID,
        "name": "Bot",
        "sender_type": "bot",
        "text": text,
        "created_at": 5000
    })
}
