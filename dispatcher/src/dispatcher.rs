//! The dispatch decision tree.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use gbot_core::{HandlerResult, Message, MessageStore, SenderKind};
use tracing::{debug, info, instrument, warn};

use crate::handler::{CommandHandler, HandlerContext, MessageHandler};
use crate::isolation::{run_isolated, Role};
use crate::registry::{HandlerRegistry, Route};
use crate::reply::ReplyHandle;
use crate::runner::{BackgroundTask, TaskRunner, TokioTaskRunner};

/// Which branch a dispatch took. Informational; nothing needs to act on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Sent by a bot; no handler ran.
    Skipped,
    /// Catch-all handlers ran; `invoked` counts them, failed ones included.
    CatchAll { invoked: usize },
    AsyncSubmitted { prefix: String },
    Command { prefix: String },
    /// Marker-prefixed text matched no command. `handled` is false when no unknown-command
    /// handler was registered and the message was dropped.
    UnknownCommand { handled: bool },
}

/// Routes each inbound message to exactly one branch of handlers.
///
/// One dispatcher per bot identity, shared behind an `Arc` by whatever receives webhooks.
/// `dispatch` is safe to call concurrently and never fails.
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    store: Option<Arc<dyn MessageStore>>,
    runner: Arc<dyn TaskRunner>,
    handler_timeout: Option<Duration>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Empty registry, no store, tokio task runner, no handler timeout.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(HandlerRegistry::new()),
            store: None,
            runner: Arc::new(TokioTaskRunner::new()),
            handler_timeout: None,
        }
    }

    /// Records every inbound message before routing.
    pub fn with_store(mut self, store: Arc<dyn MessageStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_task_runner(mut self, runner: Arc<dyn TaskRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Limits catch-all, command and unknown-command handlers. Async commands are not limited.
    pub fn with_handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = Some(timeout);
        self
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    pub fn on_message<F, Fut>(&self, f: F) -> &Self
    where
        F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.add_message_handler(Arc::new(f))
    }

    pub fn on_command<F, Fut>(&self, prefix: impl Into<String>, f: F) -> &Self
    where
        F: Fn(HandlerContext, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.add_command(prefix, Arc::new(f))
    }

    /// `ack`, if given, is sent before the handler is submitted.
    pub fn on_async_command<F, Fut>(
        &self,
        prefix: impl Into<String>,
        ack: Option<&str>,
        f: F,
    ) -> &Self
    where
        F: Fn(HandlerContext, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.add_async_command(prefix, ack, Arc::new(f))
    }

    /// The handler receives the full message text as `args`.
    pub fn on_unknown_command<F, Fut>(&self, f: F) -> &Self
    where
        F: Fn(HandlerContext, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.set_unknown_command_handler(Arc::new(f))
    }

    pub fn add_message_handler(&self, handler: Arc<dyn MessageHandler>) -> &Self {
        self.registry.register_catch_all(handler);
        self
    }

    pub fn add_command(&self, prefix: impl Into<String>, handler: Arc<dyn CommandHandler>) -> &Self {
        self.registry.register_command(prefix, handler);
        self
    }

    pub fn add_async_command(
        &self,
        prefix: impl Into<String>,
        ack: Option<&str>,
        handler: Arc<dyn CommandHandler>,
    ) -> &Self {
        self.registry
            .register_async_command(prefix, handler, ack.map(str::to_string));
        self
    }

    pub fn set_unknown_command_handler(&self, handler: Arc<dyn CommandHandler>) -> &Self {
        self.registry.register_unknown_command_handler(handler);
        self
    }

    /// Persists the message, then runs exactly one branch: skip (bot sender), async command,
    /// sync command, unknown command, or catch-all. Handler failures are logged, never returned.
    #[instrument(skip(self, message, reply), fields(message_id = %message.id, group_id = %message.group_id))]
    pub async fn dispatch(&self, message: Message, reply: ReplyHandle) -> DispatchOutcome {
        let message = Arc::new(message);
        self.persist_received(&message).await;

        if message.sender_kind == SenderKind::Bot {
            debug!(sender_id = %message.sender_id, "skipping bot message");
            return DispatchOutcome::Skipped;
        }

        let outcome = match self.registry.route(message.text.as_deref()) {
            Route::CatchAll(handlers) => {
                let invoked = handlers.len();
                for handler in handlers {
                    let ctx = HandlerContext::new(message.clone(), reply.clone());
                    run_isolated(
                        Role::CatchAll,
                        handler.name(),
                        None,
                        &message.id,
                        handler.handle(ctx),
                        self.handler_timeout,
                    )
                    .await;
                }
                DispatchOutcome::CatchAll { invoked }
            }
            Route::AsyncCommand {
                prefix,
                handler,
                ack,
                args,
            } => {
                if let Some(ack) = ack {
                    if let Err(e) = reply.text(ack).await {
                        warn!(prefix = %prefix, error = %e, "Failed to send acknowledgement");
                    }
                }
                let ctx = HandlerContext::new(message.clone(), reply);
                let name = handler.name().to_string();
                self.runner.submit(
                    BackgroundTask::new(name, message.id.clone(), async move {
                        handler.handle(ctx, args).await
                    })
                    .with_prefix(prefix.clone()),
                );
                DispatchOutcome::AsyncSubmitted { prefix }
            }
            Route::Command {
                prefix,
                handler,
                args,
            } => {
                let ctx = HandlerContext::new(message.clone(), reply);
                run_isolated(
                    Role::Command,
                    handler.name(),
                    Some(prefix.as_str()),
                    &message.id,
                    handler.handle(ctx, args),
                    self.handler_timeout,
                )
                .await;
                DispatchOutcome::Command { prefix }
            }
            Route::UnknownCommand(Some(handler)) => {
                let ctx = HandlerContext::new(message.clone(), reply);
                let text = message.text.clone().unwrap_or_default();
                run_isolated(
                    Role::UnknownCommand,
                    handler.name(),
                    None,
                    &message.id,
                    handler.handle(ctx, text),
                    self.handler_timeout,
                )
                .await;
                DispatchOutcome::UnknownCommand { handled: true }
            }
            Route::UnknownCommand(None) => {
                debug!("unknown command dropped");
                DispatchOutcome::UnknownCommand { handled: false }
            }
        };

        info!(outcome = ?outcome, "step: dispatch finished");
        outcome
    }

    async fn persist_received(&self, message: &Message) {
        if let Some(store) = &self.store {
            if let Err(e) = store.record_received(message).await {
                warn!(error = %e, "Failed to record received message");
            }
        }
    }
}
