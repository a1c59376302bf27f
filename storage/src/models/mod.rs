//! Storage models: StoredMessage (row), MessageQuery (filters), MessageStats (aggregates).

mod message_query;
mod message_stats;
mod stored_message;

pub use message_query::MessageQuery;
pub use message_stats::MessageStats;
pub use stored_message::StoredMessage;
