//! AI Gateway binary.
//!
//! A rate-limiting HTTP gateway between a web frontend and two external AI
//! services.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │                 AI GATEWAY                   │
//!                    │                                              │
//!  Client Request    │  ┌────────┐   ┌───────────┐   ┌──────────┐  │
//!  ──────────────────┼─▶│  http  │──▶│   quota   │──▶│ upstream │──┼──▶ Chat API
//!                    │  │ server │   │   gate    │   │  proxy   │  │
//!                    │  └────────┘   └───────────┘   └────┬─────┘  │
//!                    │                 429 + reset        │        │
//!  Client Response   │                 time on reject     │        │
//!  ◀─────────────────┼──────────────────────────────◀─────┘        │
//!                    │                                              │
//!                    │  ┌──────────────────────────────────────┐    │
//!                    │  │        Cross-Cutting Concerns        │    │
//!                    │  │  config │ observability │ lifecycle  │    │
//!                    │  └──────────────────────────────────────┘    │
//!                    └──────────────────────────────────────────────┘
//! ```
//!
//! The image path never calls upstream: the gateway returns a deterministic
//! URL the frontend fetches directly.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ai_gateway::config::{apply_env_overrides, load_config, GatewayConfig};
use ai_gateway::http::HttpServer;
use ai_gateway::lifecycle::{signals, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "ai-gateway")]
#[command(about = "Rate-limiting gateway for chat and image AI upstreams")]
struct Args {
    /// Path to the TOML configuration file (defaults used when absent).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener port from the config file.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ai_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("ai-gateway v0.1.0 starting");

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    // load_config already applies this; the default path needs it too.
    apply_env_overrides(&mut config);
    if let Some(port) = args.port {
        config.listener.bind_address = format!("0.0.0.0:{}", port);
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        chat_upstream = %config.chat.base_url,
        model = %config.chat.model,
        rate_limit = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            ai_gateway::observability::metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    signals::spawn(shutdown.clone());

    let server = HttpServer::new(config);
    server.run(listener, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
