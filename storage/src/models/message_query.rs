//! Query parameters for searching messages.
//!
//! Used by MessageRepository::search_messages. Unset fields do not filter.

use gbot_core::MessageDirection;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageQuery {
    pub group_id: Option<String>,
    pub user_id: Option<String>,
    pub direction: Option<MessageDirection>,
    /// Case-insensitive substring of the text.
    pub keyword: Option<String>,
    pub limit: Option<i64>,
}

impl MessageQuery {
    pub fn in_group(group_id: impl Into<String>) -> Self {
        Self {
            group_id: Some(group_id.into()),
            ..Default::default()
        }
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}
