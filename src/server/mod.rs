//! HTTP surface: `POST /api/analyze` and `GET /api/health`.

mod errors;
mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use chrono::Local;
use reqwest::Client;
use tracing::info;

use crate::agents::{Transcript, converse, default_roster};
use crate::config::Config;
use crate::fetch::HttpScraper;
use crate::lang::LlmClassifier;
use crate::llm::OpenAiClient;
use crate::research::{ContentAggregator, ResearchBundle, TIMESTAMP_FORMAT, render_initial_message};
use crate::search::SerperClient;

pub use errors::ApiError;

pub type Aggregator = ContentAggregator<SerperClient, HttpScraper<LlmClassifier<OpenAiClient>>>;

/// Shared, immutable per-process services.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Services>,
}

struct Services {
    aggregator: Aggregator,
    model: OpenAiClient,
    max_rounds: usize,
    request_timeout: Duration,
}

impl AppState {
    pub fn new(http: Client, config: &Config) -> Self {
        let model = OpenAiClient::new(http.clone(), config);
        let scraper = HttpScraper::new(
            http.clone(),
            LlmClassifier::new(model.clone()),
            config.block_private_hosts,
        );
        let aggregator = ContentAggregator::new(SerperClient::new(http, config), scraper);
        info!(model = model.model(), max_rounds = config.max_rounds, "services ready");

        Self {
            inner: Arc::new(Services {
                aggregator,
                model,
                max_rounds: config.max_rounds,
                request_timeout: config.request_timeout,
            }),
        }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.inner.aggregator
    }

    pub fn model(&self) -> &OpenAiClient {
        &self.inner.model
    }

    /// Research `"{brand_task} {user_task}"`, then let the agency discuss it.
    pub async fn analyze(
        &self,
        brand_task: &str,
        user_task: &str,
    ) -> Result<(ResearchBundle, Transcript), ApiError> {
        let query = format!("{brand_task} {user_task}");
        let bundle = self.inner.aggregator.aggregate(&query).await?;

        let message = render_initial_message(brand_task, user_task, &bundle);
        let roster = default_roster(brand_task, user_task);
        let transcript = converse(&self.inner.model, &roster, &message, self.inner.max_rounds).await?;
        Ok((bundle, transcript))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/analyze", post(handlers::analyze))
        .route("/api/health", get(handlers::health))
        .with_state(state)
}

pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await
}

fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}
