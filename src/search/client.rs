use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, warn};

use super::locale::Locale;
use super::types::{SearchRequest, SearchResponse, SearchResult};
use crate::config::{ApiKey, Config};

const SEARCH_PATH: &str = "/search";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const INITIAL_BACKOFF_MS: u64 = 1000;
const ERROR_SNIPPET_LEN: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search query must not be empty")]
    EmptyQuery,

    #[error("search API error ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("search network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl SearchError {
    /// HTTP status reported by the search API, if the failure came from it.
    pub fn status(&self) -> Option<u16> {
        match self {
            SearchError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Web search for one locale.
/// Implemented by `SerperClient` for production; mock implementations used in tests.
pub trait SearchClient {
    async fn search(&self, query: &str, locale: Locale) -> Result<Vec<SearchResult>, SearchError>;
}

#[derive(Clone)]
pub struct SerperClient {
    http: Client,
    api_key: ApiKey,
    base_url: String,
    max_attempts: u32,
}

impl SerperClient {
    pub fn new(http: Client, config: &Config) -> Self {
        Self {
            http,
            api_key: config.serper_api_key.clone(),
            base_url: config.serper_base_url.trim_end_matches('/').to_string(),
            max_attempts: config.search_max_attempts.max(1),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: ApiKey::new("test-key"),
            base_url: base_url.to_string(),
            max_attempts: 1,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    async fn search_once(
        &self,
        query: &str,
        locale: Locale,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let url = format!("{}{SEARCH_PATH}", self.base_url);
        let request = SearchRequest {
            q: query,
            gl: locale.country(),
            hl: locale.language(),
        };

        let response = self
            .http
            .post(&url)
            .header("X-API-KEY", self.api_key.expose())
            .header("User-Agent", crate::USER_AGENT)
            .json(&request)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let end = text.floor_char_boundary(ERROR_SNIPPET_LEN);
            warn!(%status, %locale, "search API error");
            return Err(SearchError::Upstream {
                status: status.as_u16(),
                message: format!("HTTP {status}: {}", &text[..end]),
            });
        }

        let body: SearchResponse = response.json().await?;
        let results: Vec<SearchResult> = body.organic.into_iter().map(SearchResult::from).collect();
        info!(query, %locale, count = results.len(), "search complete");
        Ok(results)
    }
}

impl SearchClient for SerperClient {
    async fn search(&self, query: &str, locale: Locale) -> Result<Vec<SearchResult>, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let mut attempt = 0;
        loop {
            match self.search_once(query, locale).await {
                Err(e) if is_retriable(&e) && attempt + 1 < self.max_attempts => {
                    let delay_ms = jittered_backoff(attempt);
                    debug!(attempt = attempt + 1, delay_ms, error = %e, "retrying search");
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }
}

fn is_retriable(e: &SearchError) -> bool {
    matches!(
        e,
        SearchError::Upstream {
            status: 429 | 500..=599,
            ..
        }
    )
}

/// Equal jitter backoff: base/2 + rand(0, base/2).
fn jittered_backoff(attempt: u32) -> u64 {
    let base = INITIAL_BACKOFF_MS * 2u64.pow(attempt);
    let half = base / 2;
    half + fastrand::u64(..half.max(1))
}
