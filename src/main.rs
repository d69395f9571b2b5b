//! Vedabot CLI entry point.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vedabot::cli::{commands, Cli, Commands};
use vedabot::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("vedabot={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config_path = cli
        .config
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(Settings::default_config_path);

    // `config init` must work even when the current file fails to parse
    let settings = match &cli.command {
        Commands::Config { .. } => {
            Settings::load_from(Some(&config_path)).unwrap_or_default()
        }
        _ => Settings::load_from(Some(&config_path))?,
    };

    match &cli.command {
        Commands::Ingest { source, recursive } => {
            commands::run_ingest(source.as_deref(), *recursive, settings).await?;
        }

        Commands::Ask {
            question,
            k,
            no_references,
        } => {
            commands::run_ask(question, *k, *no_references, settings).await?;
        }

        Commands::Chat { strategy } => {
            commands::run_chat(*strategy, settings).await?;
        }

        Commands::Search { query, limit } => {
            commands::run_search(query, *limit, settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host, *port, settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, &config_path)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings, &config_path)?;
        }
    }

    Ok(())
}
