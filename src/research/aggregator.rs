use chrono::Local;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::fetch::{PageScraper, ScrapedPage, redact_url_credentials};
use crate::search::{Locale, SearchClient, SearchError, SearchResult};

/// Results kept per locale, and therefore pages scraped per locale.
pub const RESULTS_PER_LOCALE: usize = 3;
/// Concurrent page fetches per aggregation.
const SCRAPE_CONCURRENCY: usize = 6;
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, thiserror::Error)]
pub enum ResearchError {
    #[error("search failed for every locale (es: {spanish}; en: {english})")]
    AggregationFailed {
        spanish: SearchError,
        english: SearchError,
    },
}

impl ResearchError {
    /// First upstream HTTP status among the underlying search failures.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            ResearchError::AggregationFailed { spanish, english } => {
                spanish.status().or_else(|| english.status())
            }
        }
    }
}

/// Lifecycle of one aggregation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Searching,
    PartialResults,
    FullResults,
    Failed,
    Scraping,
    Assembled,
}

impl Phase {
    fn after_search(spanish_ok: bool, english_ok: bool) -> Self {
        match (spanish_ok, english_ok) {
            (true, true) => Phase::FullResults,
            (false, false) => Phase::Failed,
            _ => Phase::PartialResults,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedUrl {
    pub url: String,
    pub reason: String,
}

/// Research context handed to the agent conversation. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchBundle {
    pub query: String,
    pub timestamp: String,
    pub spanish_results: Vec<SearchResult>,
    pub english_results: Vec<SearchResult>,
    pub scraped_pages: Vec<ScrapedPage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_urls: Vec<FailedUrl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_locales: Vec<Locale>,
}

impl ResearchBundle {
    pub fn results_for(&self, locale: Locale) -> &[SearchResult] {
        match locale {
            Locale::Es => &self.spanish_results,
            Locale::En => &self.english_results,
        }
    }
}

pub struct ContentAggregator<S, P> {
    search: S,
    scraper: P,
}

impl<S: SearchClient, P: PageScraper> ContentAggregator<S, P> {
    pub fn new(search: S, scraper: P) -> Self {
        Self { search, scraper }
    }

    pub async fn aggregate(&self, query: &str) -> Result<ResearchBundle, ResearchError> {
        debug!(phase = ?Phase::Idle, query, "aggregation requested");
        debug!(phase = ?Phase::Searching, "searching both locales");

        let (spanish, english) = tokio::join!(
            self.search.search(query, Locale::Es),
            self.search.search(query, Locale::En),
        );

        let phase = Phase::after_search(spanish.is_ok(), english.is_ok());
        debug!(?phase, "search finished");

        let mut missing_locales = Vec::new();
        let (mut spanish_results, mut english_results) = match (spanish, english) {
            (Err(spanish), Err(english)) => {
                warn!(es = %spanish, en = %english, "all searches failed");
                return Err(ResearchError::AggregationFailed { spanish, english });
            }
            (Ok(es), Ok(en)) => (es, en),
            (Ok(es), Err(e)) => {
                warn!(locale = %Locale::En, error = %e, "partial search failure (continuing with other results)");
                missing_locales.push(Locale::En);
                (es, Vec::new())
            }
            (Err(e), Ok(en)) => {
                warn!(locale = %Locale::Es, error = %e, "partial search failure (continuing with other results)");
                missing_locales.push(Locale::Es);
                (Vec::new(), en)
            }
        };

        spanish_results.truncate(RESULTS_PER_LOCALE);
        english_results.truncate(RESULTS_PER_LOCALE);

        debug!(phase = ?Phase::Scraping, pages = spanish_results.len() + english_results.len(), "scraping");
        let links: Vec<String> = spanish_results
            .iter()
            .chain(&english_results)
            .map(|r| r.link.clone())
            .collect();
        let (scraped_pages, failed_urls) = self.scrape_all(links).await;

        let bundle = ResearchBundle {
            query: query.to_string(),
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            spanish_results,
            english_results,
            scraped_pages,
            failed_urls,
            missing_locales,
        };

        info!(
            phase = ?Phase::Assembled,
            spanish = bundle.spanish_results.len(),
            english = bundle.english_results.len(),
            pages = bundle.scraped_pages.len(),
            failed = bundle.failed_urls.len(),
            "research bundle assembled"
        );
        Ok(bundle)
    }

    /// Scrapes every result link; pages come back in result order.
    async fn scrape_all(&self, links: Vec<String>) -> (Vec<ScrapedPage>, Vec<FailedUrl>) {
        let outcomes: Vec<_> = stream::iter(links)
            .map(|link| async move {
                let outcome = self.scraper.scrape(&link).await;
                (link, outcome)
            })
            .buffered(SCRAPE_CONCURRENCY)
            .collect()
            .await;

        let mut pages = Vec::new();
        let mut failed = Vec::new();
        for (url, outcome) in outcomes {
            match outcome {
                Ok(page) => pages.push(page),
                Err(e) => {
                    let url = redact_url_credentials(&url).into_owned();
                    warn!(%url, error = %e, "scrape failed, page omitted");
                    failed.push(FailedUrl {
                        url,
                        reason: e.to_string(),
                    });
                }
            }
        }
        (pages, failed)
    }
}



#[cfg(test)]
mod pipeline_tests {
    use super::*;
    use crate::fetch::HttpScraper;
    use crate::lang::{Language, LanguageClassifier};
    use crate::search::SerperClient;
    use reqwest::Client;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct SpanishOnly;

    impl LanguageClassifier for SpanishOnly {
        async fn classify(&self, _sample: &str) -> Language {
            Language::Es
        }
    }

    fn organic(base: &str, locale: &str, n: usize) -> serde_json::Value {
        let items: Vec<_> = (0..n)
            .map(|i| {
                serde_json::json!({
                    "title": format!("{locale} {i}"),
                    "link": format!("{base}/{locale}/{i}"),
                    "snippet": "s",
                })
            })
            .collect();
        serde_json::json!({ "organic": items })
    }

    #[tokio::test]
    async fn end_to_end_with_one_unreachable_page() {
        let server = MockServer::start().await;
        let base = server.uri();
        for (locale, gl) in [("es", "es"), ("en", "us")] {
            Mock::given(method("POST"))
                .and(path("/search"))
                .and(body_partial_json(serde_json::json!({"gl": gl})))
                .respond_with(ResponseTemplate::new(200).set_body_json(organic(&base, locale, 5)))
                .mount(&server)
                .await;
        }
        for locale in ["es", "en"] {
            for i in 0..3 {
                if locale == "en" && i == 2 {
                    continue;
                }
                Mock::given(method("GET"))
                    .and(path(format!("/{locale}/{i}")))
                    .respond_with(
                        ResponseTemplate::new(200).set_body_string(format!("<p>{locale} {i}</p>")),
                    )
                    .expect(1)
                    .mount(&server)
                    .await;
            }
        }
        Mock::given(method("GET"))
            .and(path("/en/2"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let http = Client::new();
        let aggregator = ContentAggregator::new(
            SerperClient::with_base_url(http.clone(), &base),
            HttpScraper::new(http, SpanishOnly, false),
        );

        let bundle = aggregator
            .aggregate("EcoCafe sustainability marketing")
            .await
            .unwrap();

        assert_eq!(bundle.spanish_results.len(), 3);
        assert_eq!(bundle.english_results.len(), 3);
        assert_eq!(bundle.scraped_pages.len(), 5);
        assert_eq!(bundle.scraped_pages[0].content, "es 0");
        assert_eq!(bundle.failed_urls.len(), 1);
        assert!(bundle.failed_urls[0].reason.contains("503"));
    }

    #[tokio::test]
    async fn end_to_end_bad_key_scrapes_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized."))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let http = Client::new();
        let aggregator = ContentAggregator::new(
            SerperClient::with_base_url(http.clone(), &server.uri()),
            HttpScraper::new(http, SpanishOnly, false),
        );

        let err = aggregator.aggregate("q").await.unwrap_err();
        assert_eq!(err.upstream_status(), Some(401));
    }
}
