//! Stateless built-ins: `/help`, `/echo`, greetings and the unknown-command reply.

use std::sync::Arc;

use async_trait::async_trait;
use dispatcher::{CommandHandler, HandlerContext, HandlerRegistry, MessageHandler};
use gbot_core::HandlerResult;
use tracing::debug;

const GREETINGS: [&str; 4] = ["hi", "hello", "hey", "howdy"];

/// Lists every registered command prefix, read live from the registry.
pub struct HelpCommand {
    registry: Arc<HandlerRegistry>,
}

impl HelpCommand {
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl CommandHandler for HelpCommand {
    fn name(&self) -> &str {
        "help"
    }

    async fn handle(&self, ctx: HandlerContext, _args: String) -> HandlerResult {
        let prefixes = self.registry.command_prefixes();
        let text = if prefixes.is_empty() {
            "No commands registered.".to_string()
        } else {
            format!("Available commands: {}", prefixes.join(", "))
        };
        ctx.reply.text(text).await?;
        Ok(())
    }
}

pub struct EchoCommand;

#[async_trait]
impl CommandHandler for EchoCommand {
    fn name(&self) -> &str {
        "echo"
    }

    async fn handle(&self, ctx: HandlerContext, args: String) -> HandlerResult {
        let text = if args.is_empty() {
            "Usage: /echo <text>".to_string()
        } else {
            args
        };
        ctx.reply.text(text).await?;
        Ok(())
    }
}

/// Catch-all answering messages that open with a greeting.
pub struct GreetingHandler;

#[async_trait]
impl MessageHandler for GreetingHandler {
    fn name(&self) -> &str {
        "greeting"
    }

    async fn handle(&self, ctx: HandlerContext) -> HandlerResult {
        let Some(text) = ctx.text() else {
            return Ok(());
        };
        if !is_greeting(text) {
            return Ok(());
        }
        debug!(sender = %ctx.message.sender_name, "greeting detected");
        ctx.reply
            .text(format!("Hi {}!", ctx.message.sender_name))
            .await?;
        Ok(())
    }
}

/// Receives the full text of an unmatched command.
pub struct UnknownCommandReply;

#[async_trait]
impl CommandHandler for UnknownCommandReply {
    fn name(&self) -> &str {
        "unknown-command"
    }

    async fn handle(&self, ctx: HandlerContext, text: String) -> HandlerResult {
        let command = text.split_whitespace().next().unwrap_or_default();
        ctx.reply
            .text(format!("Unknown command {}. Try /help.", command))
            .await?;
        Ok(())
    }
}

fn is_greeting(text: &str) -> bool {
    text.split_whitespace()
        .next()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .is_some_and(|word| GREETINGS.contains(&word.as_str()))
}
