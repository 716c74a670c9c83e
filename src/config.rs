//! Process-wide configuration, loaded once at startup and handed to each component.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use tracing::debug;

const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_OPENAI_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_SERPER_BASE: &str = "https://google.serper.dev";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_MAX_ROUNDS: usize = 20;
const DEFAULT_SEARCH_ATTEMPTS: u32 = 1;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} not set. Add it to the environment or a .env file")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Secret string that never shows up in `Debug` output or logs.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub serper_api_key: ApiKey,
    pub serper_base_url: String,
    pub openai_api_key: ApiKey,
    pub openai_base_url: String,
    pub model: String,
    pub bind_addr: SocketAddr,
    pub max_rounds: usize,
    pub search_max_attempts: u32,
    pub block_private_hosts: bool,
    pub request_timeout: Duration,
}

impl Config {
    /// Reads `.env` (if present) and then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => debug!(error = %e, "ignoring unreadable .env"),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let serper_api_key = get("SERPER_API_KEY").ok_or(ConfigError::Missing("SERPER_API_KEY"))?;
        let openai_api_key = get("OPENAI_API_KEY").ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            key: "BIND_ADDR",
            value: bind_raw.clone(),
        })?;

        let max_rounds = parse_or("MAX_ROUNDS", get("MAX_ROUNDS"), DEFAULT_MAX_ROUNDS)?;
        let search_max_attempts = parse_or(
            "SEARCH_MAX_ATTEMPTS",
            get("SEARCH_MAX_ATTEMPTS"),
            DEFAULT_SEARCH_ATTEMPTS,
        )?
        .max(1);
        let block_private_hosts = parse_or("SCRAPE_BLOCK_PRIVATE", get("SCRAPE_BLOCK_PRIVATE"), true)?;
        let timeout_secs = parse_or(
            "REQUEST_TIMEOUT_SECS",
            get("REQUEST_TIMEOUT_SECS"),
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;

        Ok(Self {
            serper_api_key: ApiKey(serper_api_key),
            serper_base_url: get("SERPER_BASE_URL").unwrap_or_else(|| DEFAULT_SERPER_BASE.to_string()),
            openai_api_key: ApiKey(openai_api_key),
            openai_base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE.to_string()),
            model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            bind_addr,
            max_rounds,
            search_max_attempts,
            block_private_hosts,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
