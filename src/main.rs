use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use social_feed::cli::Cli;
use social_feed::config::Config;
use social_feed::services::RefreshService;
use social_feed::storage::JsonFileStore;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    Cli::parse();

    // stdout carries only the summary lines
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::debug!(root = %config.site_root.display(), "configuration loaded");

    let store = JsonFileStore::new(config.output_path());
    let service = RefreshService::from_config(&config, store)
        .context("Failed to initialize HTTP client")?;

    service
        .run_reporting(&config, |line| println!("{}", line))
        .with_context(|| format!("Failed to write {}", config.output_path().display()))?;

    Ok(())
}
