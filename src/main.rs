mod agents;
mod config;
mod fetch;
mod lang;
mod llm;
mod research;
mod search;
mod server;

pub const USER_AGENT: &str = concat!("brandscout/", env!("CARGO_PKG_VERSION"));

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, Subcommand};
use reqwest::Client;
use tracing::info;

use config::Config;
use server::AppState;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_REDIRECTS: usize = 10;

#[derive(Parser)]
#[command(name = "brandscout", version, about = "Bilingual brand research and marketing strategy agency")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Address to listen on (overrides BIND_ADDR)
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Research a query in Spanish and English and print the bundle as JSON
    Research { query: String },
    /// Research a topic and print a content brief as JSON
    Brief {
        topic: String,
        #[arg(long, default_value = "article")]
        content_type: String,
    },
    /// Classify the sentiment of a text
    Sentiment { text: String },
    /// Translate a text to English
    Translate { text: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("brandscout=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().inspect_err(|e| tracing::error!("configuration error: {e}"))?;

    let http = Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(HTTP_TIMEOUT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()?;
    let state = AppState::new(http, &config);

    match cli.command {
        Command::Serve { bind } => {
            let addr = bind.unwrap_or(config.bind_addr);
            info!("starting brandscout API");
            server::serve(state, addr)
                .await
                .inspect_err(|e| tracing::error!("server failed: {e}"))?;
            info!("server stopped");
        }
        Command::Research { query } => {
            let bundle = state.aggregator().aggregate(&query).await?;
            println!("{}", serde_json::to_string_pretty(&bundle)?);
        }
        Command::Brief {
            topic,
            content_type,
        } => {
            let bundle = state.aggregator().aggregate(&topic).await?;
            let brief = agents::write_content(&topic, &content_type, &bundle);
            println!("{}", serde_json::to_string_pretty(&brief)?);
        }
        Command::Sentiment { text } => {
            let sentiment = agents::analyze_sentiment(state.model(), &text).await;
            println!("{}", serde_json::to_string_pretty(&sentiment)?);
        }
        Command::Translate { text } => {
            println!("{}", agents::translate_to_english(state.model(), &text).await);
        }
    }
    Ok(())
}
