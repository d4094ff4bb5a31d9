//! HTTP clients for product pages using wreq for TLS fingerprint emulation.

use crate::config::Config;
use crate::error::ExtractionError;
use crate::product::models::Price;
use crate::product::parser;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, info, warn};
use wreq::Client;
use wreq_util::Emulation;

/// Source of price readings - enables mocking for tests.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetches the product page and extracts its current price.
    async fn fetch_price(&self, url: &str) -> Result<Price, ExtractionError>;
}

/// Reachability probe used by the health check.
#[async_trait]
pub trait StatusProbe: Send + Sync {
    /// Requests the URL and returns the HTTP status code.
    async fn probe(&self, url: &str) -> Result<u16, ExtractionError>;
}

/// Builds a wreq client with the shared transport settings.
fn build_http(config: &Config, timeout: Duration) -> Result<Client> {
    let mut builder = Client::builder()
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .redirect(wreq::redirect::Policy::limited(10))
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10).min(timeout));

    if let Some(proxy_url) = &config.proxy {
        debug!("Configuring proxy: {}", proxy_url);
        let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
        builder = builder.proxy(proxy);
    }

    builder.build().context("Failed to build HTTP client")
}

/// Product page client with browser impersonation and polite request pacing.
pub struct ProductClient {
    client: Client,
    delay_ms: u64,
    delay_jitter_ms: u64,
}

impl ProductClient {
    /// Creates a new product client with the given configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let client = build_http(config, Duration::from_secs(config.fetch_timeout_secs))?;

        Ok(Self { client, delay_ms: config.delay_ms, delay_jitter_ms: config.delay_jitter_ms })
    }

    /// Performs a GET request and returns the page body.
    pub async fn fetch_page(&self, url: &str) -> Result<String, ExtractionError> {
        self.delay().await;

        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .emulation(Emulation::Chrome131)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8")
            .header("Accept-Language", "pt-BR,pt;q=0.9,en-US;q=0.8,en;q=0.7")
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await?;

        let status = response.status();
        debug!("Response status: {}", status);

        if status == 429 || status == 503 {
            warn!("Rate limited ({}). Consider using a proxy or increasing the delay.", status);
        }

        if !status.is_success() {
            return Err(ExtractionError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }

    /// Adds a random delay between requests.
    async fn delay(&self) {
        if self.delay_ms == 0 && self.delay_jitter_ms == 0 {
            return;
        }

        let jitter = if self.delay_jitter_ms > 0 {
            rand::rng().random_range(0..=self.delay_jitter_ms)
        } else {
            0
        };

        let total_delay = self.delay_ms + jitter;
        debug!("Delaying {}ms", total_delay);
        tokio::time::sleep(Duration::from_millis(total_delay)).await;
    }
}

#[async_trait]
impl PriceSource for ProductClient {
    async fn fetch_price(&self, url: &str) -> Result<Price, ExtractionError> {
        info!("Fetching price: {}", url);
        let html = self.fetch_page(url).await?;
        parser::extract_price(&html)
    }
}

/// Plain client for reachability checks, bounded by the health-check timeout.
pub struct StatusClient {
    client: Client,
}

impl StatusClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = build_http(config, Duration::from_secs(config.health_timeout_secs))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl StatusProbe for StatusClient {
    async fn probe(&self, url: &str) -> Result<u16, ExtractionError> {
        debug!("Probing {}", url);
        let response = self.client.get(url).emulation(Emulation::Chrome131).send().await?;
        Ok(response.status().as_u16())
    }
}
