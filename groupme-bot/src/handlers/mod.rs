//! Built-in handlers the binary registers.

mod basic;
mod history;

use std::sync::Arc;

use tracing::info;

use crate::runner::BotApp;

pub use basic::{EchoCommand, GreetingHandler, HelpCommand, UnknownCommandReply};
pub use history::{RecentCommand, SearchCommand, StatsCommand, SummaryCommand};

pub const SUMMARY_ACK: &str = "Working on it...";

/// Registers the built-in commands on `app`'s dispatcher. Repository-backed commands are only
/// registered when storage is enabled.
pub fn register_builtin_handlers(app: &BotApp) {
    let dispatcher = app.dispatcher();
    dispatcher
        .add_command("/help", Arc::new(HelpCommand::new(dispatcher.registry().clone())))
        .add_command("/echo", Arc::new(EchoCommand))
        .add_async_command("/summary", Some(SUMMARY_ACK), Arc::new(SummaryCommand))
        .set_unknown_command_handler(Arc::new(UnknownCommandReply))
        .add_message_handler(Arc::new(GreetingHandler));

    if let Some(repo) = app.store() {
        dispatcher
            .add_command("/recent", Arc::new(RecentCommand::new(repo.clone())))
            .add_command("/search", Arc::new(SearchCommand::new(repo.clone())))
            .add_command("/stats", Arc::new(StatsCommand::new(repo.clone())));
    }

    info!(
        commands = ?dispatcher.registry().command_prefixes(),
        "Registered built-in handlers"
    );
}
