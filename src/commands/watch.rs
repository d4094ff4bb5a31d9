//! Monitor commands: the long-lived scheduler and the single-shot run.

use crate::config::Config;
use crate::health::HealthCheck;
use crate::ledger::Ledger;
use crate::monitor::{Monitor, MonitorSettings};
use crate::notify::NotificationSink;
use crate::product::{ProductClient, StatusClient};
use crate::scheduler::{MonitorPlan, Scheduler};
use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{info, warn};

/// Runs the price monitor, either forever or once.
pub struct WatchCommand {
    config: Config,
}

impl WatchCommand {
    /// Creates a new watch command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Assembles the scheduler and its collaborators from the configuration.
    pub fn build_scheduler(&self) -> Result<Scheduler> {
        let config = &self.config;
        let tz = config.tz()?;
        let plan = MonitorPlan::from_config(config)?;

        if config.urls.is_empty() {
            warn!("No product URLs configured; set PRODUCT_URLS or `urls` in config.toml");
        }

        let ledger = Ledger::open(&config.data_dir)?;
        let source = ProductClient::new(config).context("Failed to create HTTP client")?;
        let probe = StatusClient::new(config).context("Failed to create HTTP client")?;
        let sink = NotificationSink::from_config(config)?;

        let monitor = Monitor::new(source, ledger, MonitorSettings::from_config(config), &config.urls);
        let health = HealthCheck::new(probe, &config.urls, config.send_status_updates, tz);

        Ok(Scheduler::new(monitor, health, sink, plan, tz).with_run_on_start(config.run_on_start))
    }

    /// Runs the scheduler loop until `stop` fires.
    pub async fn run(&self, stop: watch::Receiver<bool>) -> Result<()> {
        let mut scheduler = self.build_scheduler()?;

        info!("Tracking {} product(s)", self.config.urls.len());
        scheduler.run(stop).await
    }

    /// Runs one monitor cycle and one health check, then returns.
    pub async fn once(&self) -> Result<()> {
        let mut scheduler = self.build_scheduler()?;

        info!("Running a single check of {} product(s)", self.config.urls.len());
        scheduler.run_once().await;
        Ok(())
    }
}
