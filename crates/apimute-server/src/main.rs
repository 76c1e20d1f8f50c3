//! apimute API server binary.
//!
//! Wires the HTTP transport, the mutation generator, and the engine into a
//! REST API for driving mutation tests against HTTP endpoints.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use apimute_core::engine::TestEngine;
use apimute_core::mutation::MutationGenerator;
use apimute_core::transport::HttpTransport;
use apimute_server::config::ServerConfig;
use apimute_server::state::AppState;

/// apimute API server — mutation testing for HTTP APIs.
#[derive(Parser)]
#[command(name = "apimute-server", version, about)]
struct Cli {
    /// Port to listen on. Overrides the config file.
    #[arg(long)]
    port: Option<u16>,

    /// Host address to bind to. Overrides the config file.
    #[arg(long)]
    host: Option<String>,

    /// Path to the server configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (respects RUST_LOG env var).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    let bind_host = cli.host.unwrap_or_else(|| config.host.clone());
    let bind_port = cli.port.unwrap_or(config.port);

    let engine = TestEngine::with_parts(
        Arc::new(HttpTransport::new()),
        Arc::new(MutationGenerator::new()),
        config.engine_config(),
    );
    let state = Arc::new(AppState::new(engine));
    let router = apimute_server::build_router(state);

    let listener = tokio::net::TcpListener::bind(format!("{bind_host}:{bind_port}")).await?;
    tracing::info!("listening on http://{bind_host}:{bind_port}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for an OS shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to register SIGTERM handler, using Ctrl+C only");
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                }
                return;
            }
        };

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::error!(error = %e, "Ctrl+C handler error");
                }
                tracing::info!("Received Ctrl+C");
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        } else {
            tracing::info!("Received Ctrl+C");
        }
    }
}
