//! price-watch - product price tracker with e-mail and Telegram alerts.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use price_watch::commands::{config_report, NotifyCommand, StatusCommand, WatchCommand};
use price_watch::config::Config;
use price_watch::notify::Channel;
use price_watch::scheduler::stop_signal;
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "price-watch",
    version,
    about = "Tracks product prices and alerts on new lows",
    long_about = "Periodically scrapes product pages, keeps the lowest price ever seen, and sends e-mail and Telegram alerts when a new minimum appears."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the price ledger
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Product URLs to track (comma-separated, replaces configured list)
    #[arg(long, global = true, value_delimiter = ',')]
    urls: Option<Vec<String>>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the monitor forever on its schedule
    Run {
        /// Check immediately instead of waiting for the first fire time
        #[arg(long)]
        now: bool,
    },

    /// Run one price check and one health check, then exit
    Once,

    /// Show which settings and credentials are loaded
    CheckConfig,

    /// Send a test notification
    TestNotify {
        /// Channel to test (email, telegram); all when omitted
        #[arg(long)]
        channel: Option<Channel>,
    },

    /// List tracked products and their recorded lowest price
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()))
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // .env is optional; real environment variables win
    dotenvy::dotenv().ok();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(urls) = cli.urls {
        config.urls = urls.into_iter().map(|u| u.trim().to_string()).filter(|u| !u.is_empty()).collect();
    }

    match cli.command {
        Commands::Run { now } => {
            config.run_on_start |= now;

            let (stop_tx, stop_rx) = stop_signal();
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        info!("🛑 Received Ctrl+C, stopping after the current cycle...");
                        let _ = stop_tx.send(true);
                    }
                    Err(e) => {
                        warn!("Failed to listen for Ctrl+C: {}", e);
                        // Keep the sender alive so the scheduler keeps running.
                        std::future::pending::<()>().await;
                    }
                }
            });

            WatchCommand::new(config).run(stop_rx).await?;
        }

        Commands::Once => {
            WatchCommand::new(config).once().await?;
        }

        Commands::CheckConfig => {
            println!("{}", config_report(&config));
        }

        Commands::TestNotify { channel } => {
            let output = NotifyCommand::new(config)
                .execute(channel)
                .await
                .context("Test notification failed")?;
            println!("{}", output);
        }

        Commands::Status => {
            let output = StatusCommand::new(config).execute()?;
            println!("{}", output);
        }
    }

    Ok(())
}
