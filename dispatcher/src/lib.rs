//! # Dispatcher
//!
//! Routes inbound messages to registered handlers. A [`Dispatcher`] owns a [`HandlerRegistry`]
//! (catch-all handlers, sync and async command prefixes, an unknown-command slot) and runs one
//! branch per message. Async commands go to a [`TaskRunner`]; every handler runs isolated so its
//! failure or panic is logged and absorbed.

pub mod dispatcher;
pub mod handler;
mod isolation;
pub mod registry;
pub mod reply;
pub mod runner;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use handler::{CommandHandler, HandlerContext, MessageHandler};
pub use registry::{HandlerRegistry, Route};
pub use reply::ReplyHandle;
pub use runner::{BackgroundTask, TaskRunner, TokioTaskRunner};

// Unit/integration tests live in tests/
