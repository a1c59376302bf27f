//! Handler registry: prefix tables, the catch-all list and the unknown-command slot.
//!
//! Tables keep registration order. Re-registering a prefix replaces the handler in place.
//! Async prefixes are matched before sync ones.

use std::sync::{Arc, PoisonError, RwLock};

use gbot_core::COMMAND_MARKERS;
use tracing::{debug, warn};

use crate::handler::{CommandHandler, MessageHandler};

struct CommandEntry {
    prefix: String,
    handler: Arc<dyn CommandHandler>,
}

struct AsyncCommandEntry {
    prefix: String,
    handler: Arc<dyn CommandHandler>,
    ack: Option<String>,
}

#[derive(Default)]
struct HandlerTable {
    catch_all: Vec<Arc<dyn MessageHandler>>,
    commands: Vec<CommandEntry>,
    async_commands: Vec<AsyncCommandEntry>,
    unknown: Option<Arc<dyn CommandHandler>>,
}

/// Where a message goes, decided from one consistent view of the registry.
pub enum Route {
    /// No command matched: run these handlers in order.
    CatchAll(Vec<Arc<dyn MessageHandler>>),
    AsyncCommand {
        prefix: String,
        handler: Arc<dyn CommandHandler>,
        ack: Option<String>,
        args: String,
    },
    Command {
        prefix: String,
        handler: Arc<dyn CommandHandler>,
        args: String,
    },
    /// Marker-prefixed text that matched nothing. `None` drops the message.
    UnknownCommand(Option<Arc<dyn CommandHandler>>),
}

/// Shared, concurrently readable handler table. Registration is legal at any time.
#[derive(Default)]
pub struct HandlerRegistry {
    table: RwLock<HandlerTable>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_catch_all(&self, handler: Arc<dyn MessageHandler>) {
        let mut table = self.write();
        debug!(handler = %handler.name(), "registered catch-all handler");
        table.catch_all.push(handler);
    }

    /// Registers a sync command. An existing handler for `prefix` is replaced.
    pub fn register_command(&self, prefix: impl Into<String>, handler: Arc<dyn CommandHandler>) {
        let prefix = prefix.into();
        let mut table = self.write();
        if table.async_commands.iter().any(|e| e.prefix == prefix) {
            warn!(prefix = %prefix, "prefix also registered as async command; async wins");
        }
        match table.commands.iter_mut().find(|e| e.prefix == prefix) {
            Some(entry) => entry.handler = handler,
            None => table.commands.push(CommandEntry { prefix, handler }),
        }
    }

    /// Registers an async command with an optional acknowledgement. An existing handler for
    /// `prefix` is replaced, ack included.
    pub fn register_async_command(
        &self,
        prefix: impl Into<String>,
        handler: Arc<dyn CommandHandler>,
        ack: Option<String>,
    ) {
        let prefix = prefix.into();
        let mut table = self.write();
        if table.commands.iter().any(|e| e.prefix == prefix) {
            warn!(prefix = %prefix, "prefix also registered as sync command; async wins");
        }
        match table.async_commands.iter_mut().find(|e| e.prefix == prefix) {
            Some(entry) => {
                entry.handler = handler;
                entry.ack = ack;
            }
            None => table.async_commands.push(AsyncCommandEntry {
                prefix,
                handler,
                ack,
            }),
        }
    }

    pub fn register_unknown_command_handler(&self, handler: Arc<dyn CommandHandler>) {
        self.write().unknown = Some(handler);
    }

    /// Decides the branch for `text`. Commands never match absent text.
    pub fn route(&self, text: Option<&str>) -> Route {
        let table = self.read();
        let Some(text) = text else {
            return Route::CatchAll(table.catch_all.clone());
        };

        if let Some(entry) = table
            .async_commands
            .iter()
            .find(|e| text.starts_with(e.prefix.as_str()))
        {
            return Route::AsyncCommand {
                prefix: entry.prefix.clone(),
                handler: entry.handler.clone(),
                ack: entry.ack.clone(),
                args: strip_prefix(text, &entry.prefix),
            };
        }

        if let Some(entry) = table
            .commands
            .iter()
            .find(|e| text.starts_with(e.prefix.as_str()))
        {
            return Route::Command {
                prefix: entry.prefix.clone(),
                handler: entry.handler.clone(),
                args: strip_prefix(text, &entry.prefix),
            };
        }

        if text.starts_with(COMMAND_MARKERS) {
            return Route::UnknownCommand(table.unknown.clone());
        }

        Route::CatchAll(table.catch_all.clone())
    }

    /// Async then sync prefixes, each in registration order.
    pub fn command_prefixes(&self) -> Vec<String> {
        let table = self.read();
        table
            .async_commands
            .iter()
            .map(|e| e.prefix.clone())
            .chain(table.commands.iter().map(|e| e.prefix.clone()))
            .collect()
    }

    pub fn catch_all_count(&self) -> usize {
        self.read().catch_all.len()
    }

    pub fn has_unknown_command_handler(&self) -> bool {
        self.read().unknown.is_some()
    }

    // A panicking registration cannot leave the table half-written, so poisoning is ignored.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HandlerTable> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HandlerTable> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn strip_prefix(text: &str, prefix: &str) -> String {
    text[prefix.len()..].trim().to_string()
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Route::CatchAll(handlers) => f.debug_tuple("CatchAll").field(&handlers.len()).finish(),
            Route::AsyncCommand {
                prefix, ack, args, ..
            } => f
                .debug_struct("AsyncCommand")
                .field("prefix", prefix)
                .field("ack", ack)
                .field("args", args)
                .finish(),
            Route::Command { prefix, args, .. } => f
                .debug_struct("Command")
                .field("prefix", prefix)
                .field("args", args)
                .finish(),
            Route::UnknownCommand(handler) => f
                .debug_tuple("UnknownCommand")
                .field(&handler.is_some())
                .finish(),
        }
    }
}
