mod api;
mod cli;
mod config;
mod error;
mod jobs;
mod raw_files;
mod scan;
mod status;
mod tail;
mod types;
mod validation;

use anyhow::{Context, Result};
use api::AppState;
use clap::Parser;
use cli::Cli;
use config::{ConfigSource, ConfigStore};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    let cli = Cli::parse();

    // Preload the pipeline configuration so a broken file fails fast
    let store = Arc::new(ConfigStore::new(cli.config_file.clone()));
    let source = store.source();
    let config = match store.cached() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load pipeline configuration at startup");
            return Err(anyhow::Error::new(e).context("Failed to load pipeline configuration"));
        }
    };

    match (source, store.path()) {
        (ConfigSource::NotConfigured, _) | (_, None) => {
            info!("No pipeline config file configured, using default pipeline configuration")
        }
        (ConfigSource::FileMissing, Some(path)) => warn!(
            config_file = %path.display(),
            "Pipeline config file not found, using default pipeline configuration"
        ),
        (ConfigSource::Loaded, Some(path)) => info!(
            config_file = %path.display(),
            "Pipeline configuration loaded"
        ),
    }
    info!(
        input = %config.input_directory,
        output = %config.output_directory,
        "Pipeline directories"
    );

    let app = api::create_router(AppState { config: store });

    let listener = tokio::net::TcpListener::bind(cli.addr)
        .await
        .with_context(|| format!("Failed to bind {}", cli.addr))?;
    info!(addr = %cli.addr, "VOD dashboard listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down gracefully...");
}
