//! Core types: message, sender kind, direction, and webhook payload parsing.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::attachment::{Attachment, Location};

/// Characters that mark text as a command attempt.
pub const COMMAND_MARKERS: [char; 2] = ['/', '!'];

/// Who produced a message. Bot traffic is never dispatched to handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderKind {
    #[default]
    User,
    Bot,
    System,
}

impl SenderKind {
    /// Maps the platform's `sender_type`; unknown or missing values count as `User`.
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            Some("bot") => SenderKind::Bot,
            Some("system") => SenderKind::System,
            _ => SenderKind::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SenderKind::User => "user",
            SenderKind::Bot => "bot",
            SenderKind::System => "system",
        }
    }
}

impl fmt::Display for SenderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a stored message relative to the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageDirection {
    Received,
    Sent,
}

impl MessageDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageDirection::Received => "received",
            MessageDirection::Sent => "sent",
        }
    }
}

impl fmt::Display for MessageDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "received" => Ok(MessageDirection::Received),
            "sent" => Ok(MessageDirection::Sent),
            other => Err(format!("unknown message direction: {}", other)),
        }
    }
}

/// One chat event, immutable once parsed.
///
/// `id`, `group_id` and `sender_id` are always present (empty when the payload omits them);
/// `text` is `None` rather than an empty string when nothing was typed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: String,
    pub group_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_kind: SenderKind,
    pub text: Option<String>,
    pub attachments: Vec<Attachment>,
    /// Epoch seconds.
    pub created_at: i64,
    pub avatar_url: Option<String>,
    /// The payload this message was parsed from.
    #[serde(skip)]
    pub raw: Value,
}

impl Message {
    /// Parses a webhook payload. Missing fields get defaults; only a payload that is not a
    /// JSON object is rejected.
    pub fn from_payload(raw: Value) -> Result<Self, serde_json::Error> {
        let payload = WebhookPayload::deserialize(&raw)?;

        let sender_kind = if payload.system.unwrap_or(false) {
            SenderKind::System
        } else {
            SenderKind::from_wire(payload.sender_type.as_deref())
        };

        Ok(Self {
            id: payload.id.unwrap_or_default(),
            group_id: payload.group_id.unwrap_or_default(),
            sender_id: payload
                .sender_id
                .or(payload.user_id)
                .unwrap_or_default(),
            sender_name: payload.name.unwrap_or_else(|| "Unknown".to_string()),
            sender_kind,
            text: payload.text.filter(|t| !t.is_empty()),
            attachments: payload.attachments.unwrap_or_default(),
            created_at: payload.created_at.unwrap_or(0),
            avatar_url: payload.avatar_url,
            raw,
        })
    }

    /// Parses a webhook body.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        Self::from_payload(serde_json::from_str(body)?)
    }

    pub fn has_image(&self) -> bool {
        self.image_url().is_some()
    }

    /// URL of the first image attachment.
    pub fn image_url(&self) -> Option<&str> {
        self.attachments.iter().find_map(|a| match a {
            Attachment::Image { url } => Some(url.as_str()),
            _ => None,
        })
    }

    pub fn has_location(&self) -> bool {
        self.location().is_some()
    }

    /// First location attachment.
    pub fn location(&self) -> Option<&Location> {
        self.attachments.iter().find_map(|a| match a {
            Attachment::Location(loc) => Some(loc),
            _ => None,
        })
    }

    /// True when the text starts with a command marker.
    pub fn is_command(&self) -> bool {
        self.text
            .as_deref()
            .is_some_and(|t| t.starts_with(COMMAND_MARKERS))
    }

    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created_at, 0)
    }

    /// Payload form of this message. Starts from `raw` so unknown keys survive, with the
    /// known keys overwritten from the fields. Parsing the result yields an equal message.
    pub fn to_payload(&self) -> Value {
        let mut payload = match &self.raw {
            Value::Object(map) => map.clone(),
            _ => serde_json::Map::new(),
        };
        let fields = json!({
            "id": self.id,
            "group_id": self.group_id,
            "sender_id": self.sender_id,
            "user_id": self.sender_id,
            "name": self.sender_name,
            "sender_type": self.sender_kind.as_str(),
            "system": self.sender_kind == SenderKind::System,
            "text": self.text,
            "created_at": self.created_at,
            "avatar_url": self.avatar_url,
            "attachments": self.attachments,
        });
        if let Value::Object(fields) = fields {
            payload.extend(fields);
        }
        Value::Object(payload)
    }
}

/// Webhook wire format. Every field is optional; defaults are applied in [`Message::from_payload`].
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WebhookPayload {
    #[serde(deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    group_id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    sender_id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    user_id: Option<String>,
    name: Option<String>,
    sender_type: Option<String>,
    system: Option<bool>,
    text: Option<String>,
    #[serde(deserialize_with = "lenient_i64")]
    created_at: Option<i64>,
    avatar_url: Option<String>,
    attachments: Option<Vec<Attachment>>,
}

/// Identifiers are strings on the wire, but numeric ids show up in hand-written payloads.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
