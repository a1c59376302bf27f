//! Aggregate statistics for messages.
//!
//! Returned by MessageRepository::get_stats.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageStats {
    pub total: i64,
    pub received: i64,
    pub sent: i64,
    /// Distinct senders of received messages.
    pub unique_senders: i64,
    pub first_at: Option<DateTime<Utc>>,
    pub last_at: Option<DateTime<Utc>>,
}
