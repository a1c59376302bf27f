//! # GroupMe bot application
//!
//! Wires the dispatcher, the GroupMe client and optional SQLite storage behind an axum webhook.
//! Config comes from env ([`BotConfig`]); [`run_bot`] serves until Ctrl-C.

pub mod cli;
pub mod config;
pub mod handlers;
pub mod runner;
pub mod server;

pub use cli::{Cli, Commands};
pub use config::BotConfig;
pub use handlers::register_builtin_handlers;
pub use runner::{run_bot, BotApp};
pub use server::{router, serve, shutdown_signal};
