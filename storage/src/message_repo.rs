//! Message repository: persistence and queries for GroupMe messages.
//!
//! Uses SqlitePoolManager and the models (StoredMessage, MessageQuery, MessageStats).
//! Implements `gbot_core::MessageStore` so the dispatcher and reply handles can record traffic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gbot_core::{
    Attachment, Message, MessageDirection, MessageStore, SentMessage, StorageError,
};
use serde_json::{json, Value};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::{database, serialization};
use crate::models::{MessageQuery, MessageStats, StoredMessage};
use crate::sqlite_pool::SqlitePoolManager;

#[derive(Clone)]
pub struct MessageRepository {
    pool_manager: SqlitePoolManager,
}

impl MessageRepository {
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool_manager = SqlitePoolManager::new(database_url)
            .await
            .map_err(database)?;
        let repo = Self { pool_manager };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), StorageError> {
        info!("Creating database tables if not exist");

        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS groupme_messages (
                id TEXT PRIMARY KEY,
                group_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                text TEXT,
                created_at INTEGER NOT NULL,
                direction TEXT NOT NULL,
                raw_json TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await
        .map_err(database)?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_groupme_messages_group_id ON groupme_messages(group_id);
            CREATE INDEX IF NOT EXISTS idx_groupme_messages_user_id ON groupme_messages(user_id);
            CREATE INDEX IF NOT EXISTS idx_groupme_messages_created_at ON groupme_messages(created_at);
            CREATE INDEX IF NOT EXISTS idx_groupme_messages_direction ON groupme_messages(direction);
            CREATE INDEX IF NOT EXISTS idx_groupme_messages_group_user ON groupme_messages(group_id, user_id);
            "#,
        )
        .execute(pool)
        .await
        .map_err(database)?;

        info!("Database tables created successfully");
        Ok(())
    }

    /// Stores an inbound message. A second delivery of the same id overwrites the first.
    ///
    /// `raw_json` is the payload exactly as received; only messages built in code (no JSON
    /// object in `raw`) are stored in their normalized form. The `user_id` column follows the
    /// payload's `user_id`, which differs from `sender_id` for bot and system traffic.
    #[instrument(skip(self, message), fields(message_id = %message.id, group_id = %message.group_id))]
    pub async fn save_received(&self, message: &Message) -> Result<(), StorageError> {
        let raw_json = if message.raw.is_object() {
            serde_json::to_string(&message.raw)
        } else {
            serde_json::to_string(&message.to_payload())
        }
        .map_err(serialization)?;
        let user_id = message
            .raw
            .get("user_id")
            .and_then(wire_id)
            .unwrap_or_else(|| message.sender_id.clone());

        self.upsert(StoredMessage {
            id: message.id.clone(),
            group_id: message.group_id.clone(),
            user_id,
            text: message.text.clone(),
            created_at: message.created_at,
            direction: MessageDirection::Received.as_str().to_string(),
            raw_json,
        })
        .await?;
        debug!("Saved received message");
        Ok(())
    }

    /// Stores a message the bot posted under a generated `sent_<millis>_<uuid>` id. Returns the id.
    #[instrument(skip(self, sent), fields(group_id = %sent.group_id, bot_id = %sent.sender_id))]
    pub async fn save_sent(&self, sent: &SentMessage) -> Result<String, StorageError> {
        let now = Utc::now();
        let id = format!("sent_{}_{}", now.timestamp_millis(), Uuid::new_v4().simple());
        let attachments: Vec<Attachment> = sent
            .image_url
            .iter()
            .map(|url| Attachment::image(url.as_str()))
            .collect();
        let raw = json!({
            "id": id,
            "group_id": sent.group_id,
            "sender_id": sent.sender_id,
            "user_id": sent.sender_id,
            "sender_type": "bot",
            "system": false,
            "text": sent.text,
            "created_at": now.timestamp(),
            "attachments": attachments,
        });
        let raw_json = serde_json::to_string(&raw).map_err(serialization)?;

        self.upsert(StoredMessage {
            id: id.clone(),
            group_id: sent.group_id.clone(),
            user_id: sent.sender_id.clone(),
            text: Some(sent.text.clone()).filter(|t| !t.is_empty()),
            created_at: now.timestamp(),
            direction: MessageDirection::Sent.as_str().to_string(),
            raw_json,
        })
        .await?;
        debug!(id = %id, "Saved sent message");
        Ok(id)
    }

    async fn upsert(&self, record: StoredMessage) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            INSERT INTO groupme_messages (id, group_id, user_id, text, created_at, direction, raw_json)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                group_id = excluded.group_id,
                user_id = excluded.user_id,
                text = excluded.text,
                created_at = excluded.created_at,
                direction = excluded.direction,
                raw_json = excluded.raw_json
            "#,
        )
        .bind(&record.id)
        .bind(&record.group_id)
        .bind(&record.user_id)
        .bind(&record.text)
        .bind(record.created_at)
        .bind(&record.direction)
        .bind(&record.raw_json)
        .execute(pool)
        .await
        .map_err(database)?;

        Ok(())
    }

    /// Newest first; rows with equal timestamps come newest-inserted first.
    pub async fn get_recent(&self, group_id: &str, limit: i64) -> Result<Vec<Message>, StorageError> {
        let pool = self.pool_manager.pool();

        let rows: Vec<StoredMessage> = sqlx::query_as::<_, StoredMessage>(
            "SELECT * FROM groupme_messages WHERE group_id = ? ORDER BY created_at DESC, rowid DESC LIMIT ?",
        )
        .bind(group_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(database)?;

        info!(
            "Retrieved {} recent messages for group {}",
            rows.len(),
            group_id
        );

        rows.iter().map(StoredMessage::to_message).collect()
    }

    pub async fn get_message_by_id(
        &self,
        message_id: &str,
    ) -> Result<Option<StoredMessage>, StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query_as::<_, StoredMessage>("SELECT * FROM groupme_messages WHERE id = ?")
            .bind(message_id)
            .fetch_optional(pool)
            .await
            .map_err(database)
    }

    pub async fn search_messages(
        &self,
        query: &MessageQuery,
    ) -> Result<Vec<StoredMessage>, StorageError> {
        let pool = self.pool_manager.pool();
        let mut sql = String::from("SELECT * FROM groupme_messages WHERE 1=1");
        let mut params: Vec<String> = Vec::new();

        if let Some(group_id) = &query.group_id {
            sql.push_str(" AND group_id = ?");
            params.push(group_id.clone());
        }

        if let Some(user_id) = &query.user_id {
            sql.push_str(" AND user_id = ?");
            params.push(user_id.clone());
        }

        if let Some(direction) = query.direction {
            sql.push_str(" AND direction = ?");
            params.push(direction.as_str().to_string());
        }

        if let Some(keyword) = &query.keyword {
            sql.push_str(" AND LOWER(text) LIKE ? ESCAPE '\\'");
            params.push(format!("%{}%", escape_like(&keyword.to_lowercase())));
        }

        sql.push_str(" ORDER BY created_at DESC, rowid DESC");

        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut query_builder = sqlx::query_as::<_, StoredMessage>(&sql);
        for param in &params {
            query_builder = query_builder.bind(param);
        }

        let messages = query_builder.fetch_all(pool).await.map_err(database)?;
        info!("Found {} messages matching query", messages.len());

        Ok(messages)
    }

    /// Counts over one group, or over everything when `group_id` is `None`.
    pub async fn get_stats(&self, group_id: Option<&str>) -> Result<MessageStats, StorageError> {
        let pool = self.pool_manager.pool();

        let (total, received, sent, unique_senders, first_at, last_at): (
            i64,
            i64,
            i64,
            i64,
            Option<i64>,
            Option<i64>,
        ) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN direction = 'received' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN direction = 'sent' THEN 1 ELSE 0 END), 0),
                COUNT(DISTINCT CASE WHEN direction = 'received' THEN user_id END),
                MIN(created_at),
                MAX(created_at)
            FROM groupme_messages
            WHERE ? IS NULL OR group_id = ?
            "#,
        )
        .bind(group_id)
        .bind(group_id)
        .fetch_one(pool)
        .await
        .map_err(database)?;

        Ok(MessageStats {
            total,
            received,
            sent,
            unique_senders,
            first_at: first_at.and_then(|t| DateTime::from_timestamp(t, 0)),
            last_at: last_at.and_then(|t| DateTime::from_timestamp(t, 0)),
        })
    }
}

/// Ids arrive as strings or bare numbers.
fn wire_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn escape_like(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl MessageStore for MessageRepository {
    async fn record_received(&self, message: &Message) -> Result<(), StorageError> {
        self.save_received(message).await
    }

    async fn record_sent(&self, message: &SentMessage) -> Result<(), StorageError> {
        self.save_sent(message).await.map(|_| ())
    }

    async fn recent(&self, group_id: &str, limit: u32) -> Result<Vec<Message>, StorageError> {
        self.get_recent(group_id, i64::from(limit)).await
    }
}
