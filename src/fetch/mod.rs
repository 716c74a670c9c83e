//! Page scraping: download, decode, extract prose, bound its length, tag its language.

mod decode;
mod extractor;
mod ssrf;

use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::lang::{Language, LanguageClassifier};
use decode::decode_body;
use extractor::extract_text;
pub(crate) use extractor::truncate_chars;
pub(crate) use ssrf::redact_url_credentials;
use ssrf::{DnsResolver, TokioDnsResolver, ensure_public_host, parse_http_url};

/// Many sites refuse requests without a browser-like User-Agent.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Bounds the network part of a scrape: guard checks, download, redirects.
pub const SCRAPE_TIMEOUT: Duration = Duration::from_secs(10);
/// Separate budget for tagging; expiry yields `Language::Unknown`.
pub const CLASSIFY_TIMEOUT: Duration = Duration::from_secs(15);
pub const MAX_CONTENT_CHARS: usize = 5000;
/// Prefix handed to the language classifier.
pub const LANGUAGE_SAMPLE_CHARS: usize = 100;
const MAX_RESPONSE_BYTES: usize = 10_000_000;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid URL: must be HTTP(S)")]
    InvalidScheme,

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("blocked: internal/private host not allowed")]
    InternalHost,

    #[error("DNS resolution failed: {0}")]
    DnsResolution(String),

    #[error("fetch failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("fetch failed: status {0}")]
    Status(u16),

    #[error("fetch timed out after {}s", SCRAPE_TIMEOUT.as_secs())]
    Timeout,

    #[error("response too large (>{} bytes)", MAX_RESPONSE_BYTES)]
    TooLarge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedPage {
    pub url: String,
    /// Extracted text, at most `MAX_CONTENT_CHARS` characters.
    pub content: String,
    pub language: Language,
    /// Character count of the extracted text before truncation.
    pub length: usize,
}

impl ScrapedPage {
    /// Builds a page from already-extracted text, applying the length bound.
    pub fn from_text(url: impl Into<String>, text: &str, language: Language) -> Self {
        Self {
            url: url.into(),
            content: truncate_chars(text, MAX_CONTENT_CHARS).to_string(),
            language,
            length: text.chars().count(),
        }
    }

    pub fn is_truncated(&self) -> bool {
        self.length > self.content.chars().count()
    }
}

/// Turns a URL into a bounded, language-tagged text page.
pub trait PageScraper {
    async fn scrape(&self, url: &str) -> Result<ScrapedPage, FetchError>;
}

pub struct HttpScraper<C> {
    http: Client,
    classifier: C,
    block_private_hosts: bool,
    classify_timeout: Duration,
}

impl<C: LanguageClassifier> HttpScraper<C> {
    pub fn new(http: Client, classifier: C, block_private_hosts: bool) -> Self {
        Self {
            http,
            classifier,
            block_private_hosts,
            classify_timeout: CLASSIFY_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_classify_timeout(mut self, timeout: Duration) -> Self {
        self.classify_timeout = timeout;
        self
    }

    /// Downloads, decodes and extracts; returns the page text.
    async fn fetch_text(&self, url: &str, resolver: &impl DnsResolver) -> Result<String, FetchError> {
        let parsed = parse_http_url(url)?;
        if self.block_private_hosts {
            ensure_public_host(&parsed, resolver).await?;
        }

        let body = download(&self.http, parsed.as_str()).await?;

        // Redirects may land somewhere the original URL did not point to.
        if self.block_private_hosts && body.final_url != parsed.as_str() {
            ensure_public_host(&parse_http_url(&body.final_url)?, resolver).await?;
        }

        let html = decode_body(&body.bytes, body.content_type.as_deref());
        Ok(extract_text(&html))
    }

    async fn classify(&self, text: &str) -> Language {
        let sample = truncate_chars(text, LANGUAGE_SAMPLE_CHARS);
        match tokio::time::timeout(self.classify_timeout, self.classifier.classify(sample)).await {
            Ok(language) => language,
            Err(_) => {
                warn!(timeout_secs = self.classify_timeout.as_secs_f32(), "language tagging timed out");
                Language::Unknown
            }
        }
    }
}

impl<C: LanguageClassifier> PageScraper for HttpScraper<C> {
    async fn scrape(&self, url: &str) -> Result<ScrapedPage, FetchError> {
        let text = tokio::time::timeout(SCRAPE_TIMEOUT, self.fetch_text(url, &TokioDnsResolver))
            .await
            .unwrap_or(Err(FetchError::Timeout))?;
        let language = self.classify(&text).await;

        let page = ScrapedPage::from_text(url, &text, language);
        info!(
            url = %redact_url_credentials(url),
            chars = page.length,
            language = ?page.language,
            "page scraped"
        );
        Ok(page)
    }
}

struct RawBody {
    final_url: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

async fn download(client: &Client, url: &str) -> Result<RawBody, FetchError> {
    let mut response = client
        .get(url)
        .header("User-Agent", BROWSER_USER_AGENT)
        .timeout(SCRAPE_TIMEOUT)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    if let Some(len) = response.content_length()
        && len as usize > MAX_RESPONSE_BYTES
    {
        return Err(FetchError::TooLarge);
    }

    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut bytes = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        bytes.extend_from_slice(&chunk);
        if bytes.len() > MAX_RESPONSE_BYTES {
            return Err(FetchError::TooLarge);
        }
    }

    debug!(url = %final_url, bytes = bytes.len(), "page downloaded");
    Ok(RawBody {
        final_url,
        content_type,
        bytes,
    })
}
