//! Handler traits and the context a handler receives.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use gbot_core::{HandlerResult, Message};

use crate::reply::ReplyHandle;

/// What a handler gets for one dispatch: the message and a reply capability bound to the bot
/// that received it.
#[derive(Clone)]
pub struct HandlerContext {
    pub message: Arc<Message>,
    pub reply: ReplyHandle,
}

impl HandlerContext {
    pub fn new(message: Arc<Message>, reply: ReplyHandle) -> Self {
        Self { message, reply }
    }

    pub fn text(&self) -> Option<&str> {
        self.message.text.as_deref()
    }
}

/// Catch-all handler: sees every message no command claimed, including text-less ones.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn handle(&self, ctx: HandlerContext) -> HandlerResult;
}

/// Command handler. `args` is the text after the prefix, trimmed; the unknown-command
/// handler receives the full text instead.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn handle(&self, ctx: HandlerContext, args: String) -> HandlerResult;
}

#[async_trait]
impl<F, Fut> MessageHandler for F
where
    F: Fn(HandlerContext) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn handle(&self, ctx: HandlerContext) -> HandlerResult {
        (self)(ctx).await
    }
}

#[async_trait]
impl<F, Fut> CommandHandler for F
where
    F: Fn(HandlerContext, String) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn handle(&self, ctx: HandlerContext, args: String) -> HandlerResult {
        (self)(ctx, args).await
    }
}
