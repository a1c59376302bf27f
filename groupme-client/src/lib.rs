//! # groupme-client
//!
//! GroupMe bots API layer: [`GroupMeClient`] implements [`gbot_core::Sender`] by posting to
//! `{api_url}/bots/post`. Handles only outbound delivery; no dispatch or persistence.

mod client;
mod config;

pub use client::GroupMeClient;
pub use config::{ClientConfig, DEFAULT_API_URL, DEFAULT_TIMEOUT};
