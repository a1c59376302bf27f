//! groupme-bot CLI: serve the webhook, post one message, or print stored history.

use anyhow::{Context, Result};
use clap::Parser;
use gbot_core::{init_tracing, OutgoingMessage, Sender};
use groupme_bot::{register_builtin_handlers, run_bot, BotConfig, Cli, Commands};
use groupme_client::{ClientConfig, GroupMeClient};
use storage::MessageRepository;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { bot_id, bind } => {
            let mut config = BotConfig::load(bot_id)?;
            if let Some(bind) = bind {
                config.bind_addr = bind;
                config.validate()?;
            }
            init_tracing(config.log_file.as_deref())?;
            run_bot(config, register_builtin_handlers).await
        }
        Commands::Send {
            text,
            image_url,
            bot_id,
        } => {
            init_tracing(None)?;
            handle_send(text, image_url, bot_id).await
        }
        Commands::Recent { limit } => {
            init_tracing(None)?;
            handle_recent(limit).await
        }
    }
}

/// Send-only mode: posts as any bot id without serving a webhook.
async fn handle_send(text: String, image_url: Option<String>, bot_id: Option<String>) -> Result<()> {
    let client = GroupMeClient::new(ClientConfig::load(bot_id)?)?;
    let mut message = OutgoingMessage::text(text);
    if let Some(url) = image_url {
        message = message.with_image(url);
    }
    let receipt = client
        .send(&message)
        .await
        .with_context(|| format!("Failed to post as bot {}", client.bot_id()))?;
    println!("Sent as bot {} (HTTP {})", receipt.bot_id, receipt.status);
    Ok(())
}

async fn handle_recent(limit: u32) -> Result<()> {
    let config = BotConfig::load(None)?;
    let group_id = config
        .group_id
        .clone()
        .context("GROUPME_GROUP_ID is required to list recent messages")?;
    let repo = MessageRepository::new(&config.database_url)
        .await
        .with_context(|| format!("Failed to open {}", config.database_url))?;

    let messages = repo.get_recent(&group_id, i64::from(limit)).await?;
    if messages.is_empty() {
        println!("No messages stored for group {}", group_id);
        return Ok(());
    }
    for message in messages.iter().rev() {
        let when = message
            .created_at_utc()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        println!(
            "[{}] {} ({}): {}",
            when,
            message.sender_name,
            message.sender_kind,
            message.text.as_deref().unwrap_or("[no text]")
        );
    }
    Ok(())
}
