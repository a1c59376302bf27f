//! Error taxonomy shared by every crate in the workspace.
//!
//! [`GbotError`] is the top-level error; the four leaf types map to where a failure
//! originates: startup configuration, a registered handler, the outbound sender, or storage.

use std::time::Duration;

use thiserror::Error;

/// Top-level error (configuration, handler, send, storage, IO).
#[derive(Error, Debug)]
pub enum GbotError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigurationError),

    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),

    #[error("Send error: {0}")]
    Send(#[from] SendError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Missing or malformed settings. Fatal to startup, never raised during dispatch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("{name} is required: {hint}")]
    Missing {
        name: &'static str,
        hint: &'static str,
    },

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Failure raised inside a registered handler. Always absorbed at the dispatch boundary.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Reply failed: {0}")]
    Send(#[from] SendError),

    #[error("Storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Failed(String),

    #[error("Handler panicked: {0}")]
    Panicked(String),

    #[error("Handler timed out after {0:?}")]
    TimedOut(Duration),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure delivering an outbound message to the chat platform.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("Cannot send message: bot id not set")]
    MissingBotId,

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Remote API returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Failure persisting or loading messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type for core operations; uses [`GbotError`].
pub type Result<T> = std::result::Result<T, GbotError>;

/// What every handler returns.
pub type HandlerResult = std::result::Result<(), HandlerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_error_wraps_send_error() {
        let err: HandlerError = SendError::MissingBotId.into();
        assert!(matches!(err, HandlerError::Send(SendError::MissingBotId)));
        assert_eq!(err.to_string(), "Reply failed: Cannot send message: bot id not set");
    }

    #[test]
    fn test_handler_error_from_anyhow_is_transparent() {
        let err: HandlerError = anyhow::anyhow!("boom").into();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_configuration_error_message() {
        let err = ConfigurationError::Missing {
            name: "GROUPME_API_KEY",
            hint: "set it in the environment",
        };
        assert_eq!(
            err.to_string(),
            "GROUPME_API_KEY is required: set it in the environment"
        );
        let top: GbotError = err.into();
        assert!(matches!(top, GbotError::Config(_)));
    }
}
