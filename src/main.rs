mod aggregator;
mod analyzer;
mod client;
mod collector;
mod config;
mod dashboard;
mod model;
mod processor;
mod server;
mod storage;
mod utils;
#[cfg(test)]
mod test_support;

use aggregator::SentimentService;
use analyzer::{DevSentimentAnalyzer, HuggingFaceModel, LexiconModel, LinearTrendForecaster, SentimentModel};
use clap::{Parser, Subcommand};
use client::ApiClient;
use collector::{Collector, GitHubCollector, StackOverflowCollector};
use config::{load_config, AppConfig, SentimentBackend};
use std::sync::Arc;
use std::time::Duration;
use storage::SqliteStorage;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "devpulse")]
#[command(about = "Developer sentiment dashboard for GitHub and Stack Overflow")]
#[command(version)]
struct Cli {
    /// Path to the JSON config file
    #[arg(long, default_value = "config.json")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve,
    /// Interactive terminal dashboard
    Dashboard {
        /// Technology shown first
        #[arg(long, default_value = "react")]
        tech: String,
        /// API base URL (defaults to the configured api_url)
        #[arg(long)]
        api: Option<String>,
    },
    /// Classify a single text
    Analyze {
        text: String,
        /// Ask the running server instead of classifying locally
        #[arg(long)]
        remote: bool,
    },
}

fn env_secret(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn build_model(config: &AppConfig) -> anyhow::Result<Arc<dyn SentimentModel>> {
    Ok(match config.sentiment_backend {
        SentimentBackend::Lexicon => Arc::new(LexiconModel::new()),
        SentimentBackend::Huggingface => Arc::new(HuggingFaceModel::new(
            HuggingFaceModel::DEFAULT_ENDPOINT,
            &config.huggingface_model,
            env_secret("HF_TOKEN"),
        )?),
    })
}

async fn serve(config: Arc<AppConfig>) -> anyhow::Result<()> {
    // Storage is optional: without it the cache is simply not persisted
    let storage = match SqliteStorage::new(&config.db_path) {
        Ok(s) => Some(Arc::new(Mutex::new(s))),
        Err(e) => {
            warn!("⚠️ Failed to open {}: {}. Running without snapshot history", config.db_path, e);
            None
        }
    };

    let collectors: Vec<Arc<dyn Collector>> = vec![
        Arc::new(GitHubCollector::new(env_secret("GITHUB_TOKEN"))?),
        Arc::new(StackOverflowCollector::new(env_secret("STACKEXCHANGE_KEY"))?),
    ];
    let analyzer = DevSentimentAnalyzer::new(build_model(&config)?);
    let forecaster = Arc::new(LinearTrendForecaster::new(config.min_history_points));

    let service = Arc::new(SentimentService::new(
        config.clone(),
        collectors,
        analyzer,
        forecaster,
        storage,
    ));
    service.warm_cache().await;

    info!("Technologies to track: {}", config.technologies.len());
    server::start_server(&config.bind_addr, service).await
}

async fn analyze(config: &AppConfig, text: &str, remote: bool) -> anyhow::Result<()> {
    let result = if remote {
        ApiClient::shared(config)?.post_analyze(text).await?
    } else {
        DevSentimentAnalyzer::new(build_model(config)?).analyze(text).await
    };
    println!("{}", dashboard::render::render_classification(&result));
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        error!("😱 Panic occurred: {}", panic_info);
    }));

    let cli = Cli::parse();
    let config = match load_config(&cli.config) {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error: {}", e);
            return Err(e.into());
        }
    };

    match cli.command {
        Command::Serve => serve(config).await,
        Command::Dashboard { tech, api } => {
            let client = match api {
                Some(base) => ApiClient::new(&base, Duration::from_secs(config.request_timeout_seconds))?,
                None => ApiClient::shared(&config)?.clone(),
            };
            dashboard::run_dashboard(client, &tech, Duration::from_secs(config.poll_interval_seconds)).await
        }
        Command::Analyze { text, remote } => analyze(&config, &text, remote).await,
    }
}
