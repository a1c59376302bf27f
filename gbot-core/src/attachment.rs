//! Typed view over message attachments.
//!
//! The platform sends attachments as loosely shaped JSON objects tagged by `type`. Images and
//! locations get typed variants; everything else (emoji, mentions, files, ...) is carried
//! through untouched as [`Attachment::Other`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};

/// A shared location: coordinates plus a label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    pub name: String,
}

/// One attachment record on a message.
#[derive(Debug, Clone, PartialEq)]
pub enum Attachment {
    Image { url: String },
    Location(Location),
    /// Anything not recognised, kept verbatim.
    Other(Value),
}

impl Attachment {
    pub fn image(url: impl Into<String>) -> Self {
        Attachment::Image { url: url.into() }
    }

    pub fn location(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Attachment::Location(Location {
            lat,
            lng,
            name: name.into(),
        })
    }

    /// Classifies a raw attachment object. Image and location records that lack their
    /// required fields fall back to `Other` instead of failing the whole message.
    pub fn from_value(value: Value) -> Self {
        match value.get("type").and_then(Value::as_str) {
            Some("image") => match value.get("url").and_then(Value::as_str) {
                Some(url) => Attachment::image(url),
                None => Attachment::Other(value),
            },
            Some("location") => {
                let lat = coordinate(value.get("lat"));
                let lng = coordinate(value.get("lng"));
                match (lat, lng) {
                    (Some(lat), Some(lng)) => {
                        let name = value
                            .get("name")
                            .and_then(Value::as_str)
                            .unwrap_or_default();
                        Attachment::location(name, lat, lng)
                    }
                    _ => Attachment::Other(value),
                }
            }
            _ => Attachment::Other(value),
        }
    }

    /// Wire representation. Coordinates are written as strings, which is what the platform
    /// expects on outbound posts.
    pub fn to_value(&self) -> Value {
        match self {
            Attachment::Image { url } => json!({ "type": "image", "url": url }),
            Attachment::Location(loc) => json!({
                "type": "location",
                "lat": loc.lat.to_string(),
                "lng": loc.lng.to_string(),
                "name": loc.name,
            }),
            Attachment::Other(value) => value.clone(),
        }
    }

    /// The `type` tag, if any.
    pub fn kind(&self) -> Option<&str> {
        match self {
            Attachment::Image { .. } => Some("image"),
            Attachment::Location(_) => Some("location"),
            Attachment::Other(value) => value.get("type").and_then(Value::as_str),
        }
    }
}

/// Coordinates arrive as strings ("40.7") from the platform but as numbers from some clients.
fn coordinate(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl Serialize for Attachment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Attachment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Attachment::from_value)
    }
}
