//! Storage-backed built-ins. `/recent`, `/search` and `/stats` query the repository directly;
//! `/summary` runs in the background over whatever store the reply handle carries.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dispatcher::{CommandHandler, HandlerContext};
use gbot_core::{HandlerResult, Message, SenderKind};
use storage::{MessageQuery, MessageRepository};
use tracing::{debug, instrument};

const DEFAULT_RECENT: u32 = 5;
const MAX_RECENT: u32 = 20;
const SEARCH_LIMIT: usize = 5;
const SUMMARY_WINDOW: u32 = 20;
const PREVIEW_CHARS: usize = 60;

/// The message's own group, else the group the reply handle records into.
fn group_of(ctx: &HandlerContext) -> Option<String> {
    Some(ctx.message.group_id.clone())
        .filter(|g| !g.is_empty())
        .or_else(|| ctx.reply.group_id().map(str::to_string))
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

fn describe(message: &Message) -> String {
    let who = match message.sender_kind {
        SenderKind::Bot => "bot",
        _ => message.sender_name.as_str(),
    };
    let body = match &message.text {
        Some(text) => preview(text),
        None if message.has_image() => "[image]".to_string(),
        None if message.has_location() => "[location]".to_string(),
        None => "[attachment]".to_string(),
    };
    format!("{}: {}", who, body)
}

/// `/recent [n]`: the last `n` messages of the group, oldest first.
pub struct RecentCommand {
    repo: Arc<MessageRepository>,
}

impl RecentCommand {
    pub fn new(repo: Arc<MessageRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl CommandHandler for RecentCommand {
    fn name(&self) -> &str {
        "recent"
    }

    #[instrument(skip(self, ctx), fields(message_id = %ctx.message.id))]
    async fn handle(&self, ctx: HandlerContext, args: String) -> HandlerResult {
        let Some(group_id) = group_of(&ctx) else {
            ctx.reply.text("No group configured.").await?;
            return Ok(());
        };
        let count = if args.is_empty() {
            DEFAULT_RECENT
        } else {
            match args.parse::<u32>() {
                Ok(n) if n > 0 => n.min(MAX_RECENT),
                _ => {
                    ctx.reply.text("Usage: /recent [count]").await?;
                    return Ok(());
                }
            }
        };

        // The command itself was stored before dispatch; fetch one extra and drop it.
        let mut messages: Vec<Message> = self
            .repo
            .get_recent(&group_id, i64::from(count) + 1)
            .await?
            .into_iter()
            .filter(|m| m.id != ctx.message.id)
            .take(count as usize)
            .collect();
        messages.reverse();
        debug!(count = messages.len(), "recent messages loaded");

        let text = if messages.is_empty() {
            "No messages yet.".to_string()
        } else {
            let lines: Vec<String> = messages.iter().map(describe).collect();
            lines.join("\n")
        };
        ctx.reply.text(text).await?;
        Ok(())
    }
}

/// `/search <text>`: latest messages containing the text, case-insensitive.
pub struct SearchCommand {
    repo: Arc<MessageRepository>,
}

impl SearchCommand {
    pub fn new(repo: Arc<MessageRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl CommandHandler for SearchCommand {
    fn name(&self) -> &str {
        "search"
    }

    #[instrument(skip(self, ctx), fields(message_id = %ctx.message.id))]
    async fn handle(&self, ctx: HandlerContext, args: String) -> HandlerResult {
        if args.is_empty() {
            ctx.reply.text("Usage: /search <text>").await?;
            return Ok(());
        }
        let Some(group_id) = group_of(&ctx) else {
            ctx.reply.text("No group configured.").await?;
            return Ok(());
        };

        let query = MessageQuery::in_group(group_id)
            .keyword(args.as_str())
            .limit(SEARCH_LIMIT as i64 + 1);
        let mut lines = Vec::new();
        for record in self.repo.search_messages(&query).await? {
            if record.id == ctx.message.id {
                continue;
            }
            lines.push(describe(&record.to_message()?));
            if lines.len() == SEARCH_LIMIT {
                break;
            }
        }

        let text = if lines.is_empty() {
            format!("No messages matching \"{}\".", args)
        } else {
            format!("Latest matches for \"{}\":\n{}", args, lines.join("\n"))
        };
        ctx.reply.text(text).await?;
        Ok(())
    }
}

/// `/stats`: message counts for the group.
pub struct StatsCommand {
    repo: Arc<MessageRepository>,
}

impl StatsCommand {
    pub fn new(repo: Arc<MessageRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl CommandHandler for StatsCommand {
    fn name(&self) -> &str {
        "stats"
    }

    async fn handle(&self, ctx: HandlerContext, _args: String) -> HandlerResult {
        let group_id = group_of(&ctx);
        let stats = self.repo.get_stats(group_id.as_deref()).await?;

        let mut text = format!(
            "{} messages stored ({} received, {} sent) from {} people",
            stats.total, stats.received, stats.sent, stats.unique_senders
        );
        if let Some(first) = stats.first_at {
            text.push_str(&format!(" since {}", first.date_naive()));
        }
        ctx.reply.text(text).await?;
        Ok(())
    }
}

/// `/summary`: who has been talking in the last few messages. Runs as an async command.
pub struct SummaryCommand;

#[async_trait]
impl CommandHandler for SummaryCommand {
    fn name(&self) -> &str {
        "summary"
    }

    #[instrument(skip(self, ctx), fields(message_id = %ctx.message.id))]
    async fn handle(&self, ctx: HandlerContext, _args: String) -> HandlerResult {
        let (Some(store), Some(group_id)) = (ctx.reply.store(), group_of(&ctx)) else {
            ctx.reply
                .text("Message history is disabled, nothing to summarize.")
                .await?;
            return Ok(());
        };

        let messages = store.recent(&group_id, SUMMARY_WINDOW).await?;
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut considered = 0;
        for message in &messages {
            if message.id == ctx.message.id || message.sender_kind != SenderKind::User {
                continue;
            }
            considered += 1;
            *counts.entry(message.sender_name.as_str()).or_default() += 1;
        }

        if counts.is_empty() {
            ctx.reply.text("Nothing to summarize yet.").await?;
            return Ok(());
        }

        let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        let lines: Vec<String> = ranked
            .iter()
            .map(|(name, count)| format!("• {}: {}", name, count))
            .collect();
        ctx.reply
            .text(format!(
                "Summary of the last {} messages:\n{}",
                considered,
                lines.join("\n")
            ))
            .await?;
        Ok(())
    }
}
