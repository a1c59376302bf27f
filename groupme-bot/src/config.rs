//! Application config, loaded from env. Validation failures are fatal to startup only.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use gbot_core::ConfigurationError;
use groupme_client::{ClientConfig, DEFAULT_API_URL};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_WEBHOOK_PATH: &str = "/webhook";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://messages.db";

#[derive(Debug, Clone)]
pub struct BotConfig {
    /// GROUPME_API_KEY
    pub api_key: String,
    /// GROUPME_BOT_ID, or the CLI override
    pub bot_id: String,
    /// GROUPME_GROUP_ID
    pub group_id: Option<String>,
    /// GROUPME_API_URL
    pub api_url: String,
    /// BIND_ADDR
    pub bind_addr: String,
    /// WEBHOOK_PATH
    pub webhook_path: String,
    /// ENABLE_STORAGE
    pub enable_storage: bool,
    /// DATABASE_URL
    pub database_url: String,
    /// LOG_FILE
    pub log_file: Option<String>,
    /// HANDLER_TIMEOUT_SECS; unset means no timeout.
    pub handler_timeout: Option<Duration>,
    /// MAX_BACKGROUND_TASKS; unset means no cap.
    pub max_background_tasks: Option<usize>,
}

impl BotConfig {
    /// Load from environment variables. `bot_id` overrides GROUPME_BOT_ID if provided.
    pub fn load(bot_id: Option<String>) -> Result<Self, ConfigurationError> {
        let api_key = required("GROUPME_API_KEY", "create a token at dev.groupme.com")?;
        let bot_id = match bot_id.filter(|v| !v.is_empty()) {
            Some(id) => id,
            None => required("GROUPME_BOT_ID", "set it or pass --bot-id")?,
        };

        let config = Self {
            api_key,
            bot_id,
            group_id: optional("GROUPME_GROUP_ID"),
            api_url: optional("GROUPME_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            bind_addr: optional("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            webhook_path: optional("WEBHOOK_PATH")
                .unwrap_or_else(|| DEFAULT_WEBHOOK_PATH.to_string()),
            enable_storage: parse_bool("ENABLE_STORAGE")?.unwrap_or(false),
            database_url: optional("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            log_file: optional("LOG_FILE"),
            handler_timeout: parse_number::<u64>("HANDLER_TIMEOUT_SECS")?
                .map(Duration::from_secs),
            max_background_tasks: parse_number::<usize>("MAX_BACKGROUND_TASKS")?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks URL, listen address and webhook path formats.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if let Err(e) = reqwest::Url::parse(&self.api_url) {
            return Err(ConfigurationError::Invalid {
                name: "GROUPME_API_URL",
                reason: format!("{} is not a valid URL: {}", self.api_url, e),
            });
        }
        self.socket_addr()?;
        if !self.webhook_path.starts_with('/') {
            return Err(ConfigurationError::Invalid {
                name: "WEBHOOK_PATH",
                reason: format!("{} must start with '/'", self.webhook_path),
            });
        }
        if self.webhook_path == crate::server::HEALTH_PATH {
            return Err(ConfigurationError::Invalid {
                name: "WEBHOOK_PATH",
                reason: format!("{} is reserved for health checks", self.webhook_path),
            });
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigurationError> {
        self.bind_addr
            .parse()
            .map_err(|e| ConfigurationError::Invalid {
                name: "BIND_ADDR",
                reason: format!("{} is not a socket address: {}", self.bind_addr, e),
            })
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::with_bot_id(&self.bot_id).api_url(&self.api_url)
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required(name: &'static str, hint: &'static str) -> Result<String, ConfigurationError> {
    optional(name).ok_or(ConfigurationError::Missing { name, hint })
}

fn parse_bool(name: &'static str) -> Result<Option<bool>, ConfigurationError> {
    match optional(name).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(None),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigurationError::Invalid {
                name,
                reason: format!("{} is not a boolean", v),
            }),
        },
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigurationError> {
    match optional(name) {
        None => Ok(None),
        Some(v) => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigurationError::Invalid {
                name,
                reason: format!("{} is not a number", v),
            }),
    }
}
