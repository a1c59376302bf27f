//! Storage crate: SQLite message history for the bot.
//!
//! ## Modules
//!
//! - [`models`] – StoredMessage, MessageQuery, MessageStats
//! - [`message_repo`] – MessageRepository (SQLite), implements `gbot_core::MessageStore`
//! - [`sqlite_pool`] – SqlitePoolManager

mod error;
mod message_repo;
mod models;
mod sqlite_pool;

pub use message_repo::MessageRepository;
pub use models::{MessageQuery, MessageStats, StoredMessage};
pub use sqlite_pool::SqlitePoolManager;
