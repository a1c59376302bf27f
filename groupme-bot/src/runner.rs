//! Application wiring: client, optional store and dispatcher built from config; webhook payloads
//! turned into dispatches.

use std::sync::Arc;

use anyhow::{Context, Result};
use dispatcher::{DispatchOutcome, Dispatcher, ReplyHandle, TaskRunner, TokioTaskRunner};
use gbot_core::{Message, Sender};
use groupme_client::GroupMeClient;
use serde_json::Value;
use storage::MessageRepository;
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::config::BotConfig;
use crate::server::{serve, shutdown_signal};

/// One bot identity: its config, dispatcher, sender and (optional) message store.
pub struct BotApp {
    config: BotConfig,
    dispatcher: Arc<Dispatcher>,
    sender: Arc<dyn Sender>,
    store: Option<Arc<MessageRepository>>,
}

impl BotApp {
    /// Builds the GroupMe client and, when enabled, opens the message store.
    pub async fn build(config: BotConfig) -> Result<Self> {
        let client =
            GroupMeClient::new(config.client_config()).context("Failed to build GroupMe client")?;
        let store = if config.enable_storage {
            let repo = MessageRepository::new(&config.database_url)
                .await
                .with_context(|| format!("Failed to open message store {}", config.database_url))?;
            Some(Arc::new(repo))
        } else {
            None
        };
        Ok(Self::from_parts(config, Arc::new(client), store))
    }

    /// Wires a dispatcher around an existing sender and store.
    pub fn from_parts(
        config: BotConfig,
        sender: Arc<dyn Sender>,
        store: Option<Arc<MessageRepository>>,
    ) -> Self {
        let runner: Arc<dyn TaskRunner> = match config.max_background_tasks {
            Some(max) => Arc::new(TokioTaskRunner::with_max_concurrency(max)),
            None => Arc::new(TokioTaskRunner::new()),
        };
        let mut dispatcher = Dispatcher::new().with_task_runner(runner);
        if let Some(timeout) = config.handler_timeout {
            dispatcher = dispatcher.with_handler_timeout(timeout);
        }
        if let Some(store) = &store {
            dispatcher = dispatcher.with_store(store.clone());
        }

        Self {
            config,
            dispatcher: Arc::new(dispatcher),
            sender,
            store,
        }
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn store(&self) -> Option<&Arc<MessageRepository>> {
        self.store.as_ref()
    }

    /// Reply capability for `message`. Sent messages are recorded under the message's group,
    /// or the configured group when the payload had none.
    pub fn reply_handle(&self, message: &Message) -> ReplyHandle {
        let reply = ReplyHandle::new(self.sender.clone());
        let group_id = Some(message.group_id.clone())
            .filter(|g| !g.is_empty())
            .or_else(|| self.config.group_id.clone());
        match (&self.store, group_id) {
            (Some(store), Some(group_id)) => reply.with_store(store.clone(), group_id),
            _ => reply,
        }
    }

    /// Parses one webhook payload and dispatches it. Only an unparseable payload is an error.
    #[instrument(skip(self, payload))]
    pub async fn handle_payload(&self, payload: Value) -> Result<DispatchOutcome, serde_json::Error> {
        let message = Message::from_payload(payload)?;
        info!(
            message_id = %message.id,
            group_id = %message.group_id,
            sender = %message.sender_name,
            sender_kind = %message.sender_kind,
            "Received message"
        );
        let reply = self.reply_handle(&message);
        Ok(self.dispatcher.dispatch(message, reply).await)
    }
}

/// Main entry: build the app, let `register` wire handlers onto it, then serve the webhook until
/// Ctrl-C.
#[instrument(skip(config, register))]
pub async fn run_bot<F>(config: BotConfig, register: F) -> Result<()>
where
    F: FnOnce(&BotApp),
{
    let addr = config.socket_addr()?;

    info!(
        bot_id = %config.bot_id,
        webhook_path = %config.webhook_path,
        storage = config.enable_storage,
        database_url = %config.database_url,
        "Initializing bot"
    );

    let app = Arc::new(BotApp::build(config).await?);
    register(app.as_ref());

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Bot started successfully");
    serve(app, listener, shutdown_signal()).await
}
