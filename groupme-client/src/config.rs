//! Minimal client configuration: API URL, bot id, request timeout.
//! Loaded from GROUPME_API_URL and GROUPME_BOT_ID.

use std::env;
use std::time::Duration;

use gbot_core::ConfigurationError;

pub const DEFAULT_API_URL: &str = "https://api.groupme.com/v3";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL without a trailing slash.
    pub api_url: String,
    pub bot_id: String,
    pub timeout: Duration,
}

impl ClientConfig {
    /// GROUPME_BOT_ID is required; GROUPME_API_URL is optional.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::load(None)
    }

    /// Like [`from_env`](Self::from_env), with `bot_id` taking precedence over GROUPME_BOT_ID.
    pub fn load(bot_id: Option<String>) -> Result<Self, ConfigurationError> {
        let bot_id = bot_id
            .or_else(|| env::var("GROUPME_BOT_ID").ok())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigurationError::Missing {
                name: "GROUPME_BOT_ID",
                hint: "set it to the id of the bot to post as",
            })?;
        let mut config = Self::with_bot_id(bot_id);
        if let Ok(api_url) = env::var("GROUPME_API_URL") {
            config = config.api_url(api_url);
        }
        Ok(config)
    }

    /// Default API URL and timeout.
    pub fn with_bot_id(bot_id: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            bot_id: bot_id.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn post_url(&self) -> String {
        format!("{}/bots/post", self.api_url)
    }
}
