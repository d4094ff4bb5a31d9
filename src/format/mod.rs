//! Message and price formatting for notifications, logs, and CLI output.

use crate::config::Config;
use crate::product::Price;
use chrono::{DateTime, TimeZone};
use std::fmt::Display;

/// How prices are presented to people. Presentation only: comparisons
/// always use [`Price`] values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceFormat {
    pub currency_symbol: String,
    pub decimal_comma: bool,
}

impl Default for PriceFormat {
    fn default() -> Self {
        Self { currency_symbol: "R$".to_string(), decimal_comma: true }
    }
}

impl PriceFormat {
    pub fn from_config(config: &Config) -> Self {
        Self { currency_symbol: config.currency_symbol.clone(), decimal_comma: config.decimal_comma }
    }

    /// Formats a price, e.g. `R$ 199,90`.
    pub fn price(&self, price: Price) -> String {
        let separator = if self.decimal_comma { ',' } else { '.' };
        let amount = format!("{}{}{:02}", price.units(), separator, price.subunits());
        if self.currency_symbol.is_empty() {
            amount
        } else {
            format!("{} {}", self.currency_symbol, amount)
        }
    }

    /// Formats an optional price, `-` when absent.
    pub fn maybe_price(&self, price: Option<Price>) -> String {
        price.map(|p| self.price(p)).unwrap_or_else(|| "-".to_string())
    }

    /// Message for a new lowest price.
    pub fn new_minimum(&self, url: &str, price: Price, previous: Option<Price>) -> String {
        match previous {
            Some(previous) => format!(
                "🔔 New lowest price: {} - {} (previous: {})",
                url,
                self.price(price),
                self.price(previous)
            ),
            None => format!("🔔 New lowest price: {} - {}", url, self.price(price)),
        }
    }

    /// Message for a reading that did not beat the recorded minimum.
    pub fn informational(&self, url: &str, price: Price, lowest: Option<Price>) -> String {
        match lowest {
            Some(lowest) => format!(
                "ℹ️ Current price: {} - {} (lowest: {})",
                url,
                self.price(price),
                self.price(lowest)
            ),
            None => format!("ℹ️ Current price: {} - {}", url, self.price(price)),
        }
    }
}

/// Timestamp in the given timezone, `YYYY-MM-DD HH:MM:SS`.
pub fn timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Health check message for a reachable URL.
pub fn health_ok(ts: &str, url: &str, status: u16) -> String {
    format!("✅ [{}] Alive! {} reachable ({})", ts, url, status)
}

/// Health check message for a non-OK status.
pub fn health_bad_status(ts: &str, url: &str, status: u16) -> String {
    format!("❌ [{}] {} responded with status {}", ts, url, status)
}

/// Health check message for a transport failure.
pub fn health_error(ts: &str, url: &str, error: &dyn Display) -> String {
    format!("❌ [{}] Error reaching {}: {}", ts, url, error)
}

/// Shortens long text for terminal listings.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
