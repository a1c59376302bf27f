//! Out-of-band execution for async commands.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use gbot_core::HandlerResult;
use tokio::sync::Semaphore;
use tracing::{debug, error};

use crate::isolation::{guard, report, Role};

/// A handler invocation scheduled to run independently of the dispatch that produced it.
pub struct BackgroundTask {
    /// Handler name for logs.
    pub label: String,
    /// Command prefix the handler was registered under, if any.
    pub prefix: Option<String>,
    pub message_id: String,
    pub future: BoxFuture<'static, HandlerResult>,
}

impl BackgroundTask {
    pub fn new(
        label: impl Into<String>,
        message_id: impl Into<String>,
        future: impl Future<Output = HandlerResult> + Send + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            prefix: None,
            message_id: message_id.into(),
            future: Box::pin(future),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

/// Fire-and-forget executor.
///
/// `submit` hands the task off and returns without waiting on it. Each task runs at most
/// once with no ordering guarantee, and its failure never reaches the submitter.
pub trait TaskRunner: Send + Sync {
    fn submit(&self, task: BackgroundTask);
}

/// Spawns tasks onto the current tokio runtime.
#[derive(Clone, Default)]
pub struct TokioTaskRunner {
    in_flight: Arc<AtomicUsize>,
    limit: Option<Arc<Semaphore>>,
}

impl TokioTaskRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs at most `max` tasks at a time. Extra tasks wait inside their own spawned task,
    /// so `submit` still returns immediately.
    pub fn with_max_concurrency(max: usize) -> Self {
        Self {
            in_flight: Arc::default(),
            limit: Some(Arc::new(Semaphore::new(max.max(1)))),
        }
    }

    /// Tasks submitted and not yet finished (queued ones included).
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

impl TaskRunner for TokioTaskRunner {
    fn submit(&self, task: BackgroundTask) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                error!(handler = %task.label, prefix = task.prefix.as_deref(), message_id = %task.message_id, error = %e, "No runtime to run background task; dropped");
                return;
            }
        };

        let in_flight = self.in_flight.clone();
        let limit = self.limit.clone();
        in_flight.fetch_add(1, Ordering::SeqCst);
        debug!(handler = %task.label, prefix = task.prefix.as_deref(), message_id = %task.message_id, "background task submitted");

        handle.spawn(async move {
            let _permit = match limit {
                Some(sem) => sem.acquire_owned().await.ok(),
                None => None,
            };
            let BackgroundTask {
                label,
                prefix,
                message_id,
                future,
            } = task;
            let result = guard(future, None).await;
            report(
                Role::AsyncCommand,
                &label,
                prefix.as_deref(),
                &message_id,
                &result,
            );
            in_flight.fetch_sub(1, Ordering::SeqCst);
        });
    }
}
