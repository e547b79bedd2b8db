//! notion-cors-proxy
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────┐
//!                     │                  NOTION CORS PROXY                   │
//!                     │                                                      │
//!   Browser Request   │  ┌─────────┐   ┌──────────┐   ┌──────────────────┐   │
//!   ──────────────────┼─▶│  http   │──▶│ security │──▶│     routing      │   │
//!                     │  │ server  │   │ origin + │   │ target resolver  │   │
//!                     │  └─────────┘   │ preflight│   └────────┬─────────┘   │
//!                     │                └──────────┘            │             │
//!                     │                                        ▼             │
//!                     │                               ┌──────────────────┐   │
//!                     │                               │    transform     │   │
//!                     │                               │ headers + body   │   │
//!                     │                               └────────┬─────────┘   │
//!                     │                                        ▼             │
//!   Browser Response  │  ┌──────────┐   ┌──────────┐   ┌──────────────────┐  │
//!   ◀─────────────────┼──│   CORS   │◀──│ response │◀──│  upstream client │◀─┼── api.notion.com
//!                     │  │ headers  │   │  (debug) │   │     (reqwest)    │  │
//!                     │  └──────────┘   └──────────┘   └──────────────────┘  │
//!                     │                                                      │
//!                     │   config · observability · lifecycle                 │
//!                     └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use notion_cors_proxy::config::{load_config, validation::validate_config, ConfigError, ProxyConfig};
use notion_cors_proxy::lifecycle::startup;
use notion_cors_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "notion-cors-proxy")]
#[command(about = "CORS-relaxing reverse proxy for the Notion API", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    logging::init(&config.observability)?;

    tracing::info!("notion-cors-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        addressing = ?config.routing.addressing,
        allowed_origins = config.cors.allowed_origins.len(),
        "Configuration loaded"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
