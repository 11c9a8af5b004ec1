//! CLI entrypoint for foresight
//!
//! This is the main binary that wires together all layers using
//! dependency injection: config is loaded and converted, the HTTP
//! invoker and evidence sources are constructed, and one question is
//! forecast end to end.

use anyhow::{Context, Result};
use clap::Parser;
use foresight_application::{ForecastPipeline, SearchProvider};
use foresight_infrastructure::search::{DuckDuckGoSource, NewsApiSource, WikipediaSource};
use foresight_infrastructure::{ConfigLoader, OpenRouterInvoker, load_question};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "foresight", about = "Ensemble LLM forecasting pipeline", version)]
struct Cli {
    /// Path to a TOML question file
    question: PathBuf,

    /// Explicit config file path (highest priority)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ignore all config files and use built-in defaults
    #[arg(long)]
    no_config: bool,

    /// Emit the full result as JSON instead of the markdown report
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())?
    };

    let question = load_question(&cli.question)
        .with_context(|| format!("loading question from {}", cli.question.display()))?;
    info!(question = %question, "loaded question");

    // === Dependency injection ===
    let api_key = config.resolve_api_key()?;
    let mut invoker = OpenRouterInvoker::new(api_key);
    if let Some(api_url) = &config.provider.api_url {
        invoker = invoker.with_api_url(api_url);
    }

    let http = reqwest::Client::new();
    let sources: Vec<Arc<dyn SearchProvider>> = vec![
        Arc::new(DuckDuckGoSource::new(http.clone())),
        Arc::new(WikipediaSource::new(http.clone())),
        Arc::new(NewsApiSource::new(http, config.resolve_newsapi_key())),
    ];

    let pipeline = ForecastPipeline::new(
        Arc::new(invoker),
        sources,
        config.concurrency_limits(),
        config.pipeline_config()?,
    )?;

    let result = pipeline.forecast(&question).await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.render_report());
    }
    Ok(())
}
