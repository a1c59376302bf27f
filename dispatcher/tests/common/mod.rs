//! Shared test utilities for dispatcher integration tests.
//!
//! Provides MockSender (Sender) and MockStore (MessageStore) that record calls, LogCapture for
//! asserting on emitted events, plus message builders.

use std::sync::atomic::{AtomicBool, Ordering};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dispatcher::ReplyHandle;
use gbot_core::{
    Message, MessageStore, OutgoingMessage, SendError, SendReceipt, Sender, SenderKind,
    SentMessage, StorageError,
};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

/// Records every outgoing message; fails every send when `failing` is set.
pub struct MockSender {
    pub sent: Mutex<Vec<OutgoingMessage>>,
    failing: AtomicBool,
}

#[allow(dead_code)]
impl MockSender {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        })
    }

    pub fn failing() -> Arc<Self> {
        let sender = Self::new();
        sender.failing.store(true, Ordering::SeqCst);
        sender
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|m| m.text.clone()).collect()
    }
}

#[async_trait]
impl Sender for MockSender {
    fn bot_id(&self) -> &str {
        "test_bot"
    }

    async fn send(&self, message: &OutgoingMessage) -> Result<SendReceipt, SendError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SendError::Status {
                status: 500,
                body: "down".to_string(),
            });
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(SendReceipt {
            bot_id: "test_bot".to_string(),
            status: 202,
        })
    }
}

/// In-memory MessageStore; fails every write when `failing` is set.
pub struct MockStore {
    pub received: Mutex<Vec<Message>>,
    pub sent: Mutex<Vec<SentMessage>>,
    failing: bool,
}

#[allow(dead_code)]
impl MockStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            received: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            failing: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            received: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            failing: true,
        })
    }
}

#[async_trait]
impl MessageStore for MockStore {
    async fn record_received(&self, message: &Message) -> Result<(), StorageError> {
        if self.failing {
            return Err(StorageError::Database("disk full".to_string()));
        }
        self.received.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn record_sent(&self, message: &SentMessage) -> Result<(), StorageError> {
        if self.failing {
            return Err(StorageError::Database("disk full".to_string()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn recent(&self, group_id: &str, limit: u32) -> Result<Vec<Message>, StorageError> {
        Ok(self
            .received
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|m| m.group_id == group_id)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

/// A user text message in group "group_1".
#[allow(dead_code)]
pub fn user_message(text: &str) -> Message {
    Message::from_payload(serde_json::json!({
        "id": "msg_1",
        "group_id": "group_1",
        "sender_id": "user_1",
        "name": "Alice",
        "sender_type": "user",
        "text": text,
        "created_at": 1700000000,
        "attachments": []
    }))
    .unwrap()
}

#[allow(dead_code)]
pub fn bot_message(text: &str) -> Message {
    let mut message = user_message(text);
    message.sender_kind = SenderKind::Bot;
    message
}

#[allow(dead_code)]
pub fn reply_for(sender: &Arc<MockSender>) -> ReplyHandle {
    ReplyHandle::new(sender.clone())
}

/// Collects formatted log output of the current thread while its guard is alive.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

#[allow(dead_code)]
impl LogCapture {
    pub fn install(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Polls until a line containing `needle` was logged or two seconds pass.
    pub async fn wait_for(&self, needle: &str) -> String {
        for _ in 0..100 {
            let contents = self.contents();
            if contents.contains(needle) {
                return contents;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.contents()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
