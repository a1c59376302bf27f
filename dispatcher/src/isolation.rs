//! Failure isolation around handler invocations.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use gbot_core::{HandlerError, HandlerResult};
use tracing::{debug, error, warn};

/// Where a handler runs in the decision tree; shows up in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    CatchAll,
    Command,
    AsyncCommand,
    UnknownCommand,
}

impl Role {
    fn as_str(&self) -> &'static str {
        match self {
            Role::CatchAll => "catch_all",
            Role::Command => "command",
            Role::AsyncCommand => "async_command",
            Role::UnknownCommand => "unknown_command",
        }
    }
}

/// Runs a handler future, turning panics and timeouts into [`HandlerError`]s.
pub(crate) async fn guard<F>(fut: F, timeout: Option<Duration>) -> HandlerResult
where
    F: Future<Output = HandlerResult> + Send,
{
    let caught = AssertUnwindSafe(fut).catch_unwind();
    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, caught).await {
            Ok(outcome) => outcome,
            Err(_) => return Err(HandlerError::TimedOut(limit)),
        },
        None => caught.await,
    };
    outcome.unwrap_or_else(|payload| Err(HandlerError::Panicked(panic_message(payload.as_ref()))))
}

/// Runs a handler in isolation and logs its outcome once.
pub(crate) async fn run_isolated<F>(
    role: Role,
    handler: &str,
    prefix: Option<&str>,
    message_id: &str,
    fut: F,
    timeout: Option<Duration>,
) where
    F: Future<Output = HandlerResult> + Send,
{
    let result = guard(fut, timeout).await;
    report(role, handler, prefix, message_id, &result);
}

/// `handler` is the handler's `name()`; `prefix` is the command it was registered under.
pub(crate) fn report(
    role: Role,
    handler: &str,
    prefix: Option<&str>,
    message_id: &str,
    result: &HandlerResult,
) {
    match result {
        Ok(()) => debug!(
            role = role.as_str(),
            handler = %handler,
            prefix,
            message_id = %message_id,
            "handler done"
        ),
        Err(e @ HandlerError::Panicked(_)) => error!(
            role = role.as_str(),
            handler = %handler,
            prefix,
            message_id = %message_id,
            error = %e,
            "Handler panicked"
        ),
        Err(e) => warn!(
            role = role.as_str(),
            handler = %handler,
            prefix,
            message_id = %message_id,
            error = %e,
            "Handler failed"
        ),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
