//! prompt-enhancer - local Web UI for turning prompt components into a structured prompt

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use prompt_enhancer::config::{Config, ConfigOptions};
use prompt_enhancer::enhancer::{EnhancerServer, EnhancerSettings, PromptEnhancer};
use prompt_enhancer::http_logger::HttpLogger;
use prompt_enhancer::service::OpenAiCompletionService;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "prompt-enhancer")]
#[command(about = "Local Web UI that turns role, context and task into a structured AI prompt")]
struct Args {
    /// Base URL of the OpenAI-compatible completion API
    #[arg(long)]
    base_url: Option<String>,

    /// Model identifier sent with every request
    #[arg(long)]
    model: Option<String>,

    /// Output token ceiling per enhancement
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Sampling temperature (0.0 - 2.0)
    #[arg(long)]
    temperature: Option<f64>,

    /// First port to try for the Web UI
    #[arg(long)]
    port: Option<u16>,

    /// Idle session lifetime in seconds
    #[arg(long = "session-ttl")]
    session_ttl: Option<u64>,

    /// Do not open the browser automatically
    #[arg(long)]
    no_browser: bool,

    /// Append completion requests and responses to this file (credentials masked)
    #[arg(long, value_name = "FILE")]
    http_log: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = Config::new(ConfigOptions {
        base_url: args.base_url,
        model: args.model,
        max_tokens: args.max_tokens,
        temperature: args.temperature,
        port: args.port,
        session_ttl_secs: args.session_ttl,
        no_browser: args.no_browser,
        http_log_path: args.http_log,
    })?;

    let mut service = OpenAiCompletionService::new(config.base_url.clone())?;
    if let Some(path) = &config.http_log_path {
        info!("HTTP logging enabled: {}", path.display());
        service = service.with_http_logger(Arc::new(HttpLogger::new(path)));
    }

    let enhancer = PromptEnhancer::new(Arc::new(service), EnhancerSettings::from(config.as_ref()));
    let server = EnhancerServer::new(
        enhancer,
        config.port,
        Duration::from_secs(config.session_ttl_secs),
    );

    info!(
        "Starting prompt enhancer (endpoint {}, model {})",
        config.base_url, config.model
    );
    server.start().await?;

    let url = server.url().await;
    info!("Please open in browser: {}", url);
    if config.open_browser {
        open_browser(&url);
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutting down, discarding {} session(s)", server.session_count().await);
    Ok(())
}

/// Open browser
fn open_browser(url: &str) {
    if let Err(e) = open::that(url) {
        warn!("Could not auto-open browser: {}, URL: {}", e, url);
        info!("Please manually open: {}", url);
    }
}
