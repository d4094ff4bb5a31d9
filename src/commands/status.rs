//! Read-only commands: ledger status and configuration check.

use crate::config::Config;
use crate::format::{truncate, PriceFormat};
use crate::ledger::{self, Ledger};
use anyhow::Result;

/// Lists tracked products with their recorded lowest price.
pub struct StatusCommand {
    config: Config,
}

impl StatusCommand {
    /// Creates a new status command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Opens the configured ledger and renders the listing.
    pub fn execute(&self) -> Result<String> {
        let ledger = Ledger::open(&self.config.data_dir)?;
        self.execute_with_ledger(&ledger)
    }

    /// Renders the listing from a provided ledger (for testing).
    pub fn execute_with_ledger(&self, ledger: &Ledger) -> Result<String> {
        let format = PriceFormat::from_config(&self.config);
        let mut lines = Vec::new();

        if self.config.urls.is_empty() {
            lines.push("No products configured.".to_string());
        } else {
            lines.push(format!("{:<14} {:<60}", "Lowest", "URL"));
            lines.push(format!("{:-<14} {:-<60}", "", ""));
            for url in &self.config.urls {
                lines.push(format!(
                    "{:<14} {:<60}",
                    format.maybe_price(ledger.read(url)),
                    truncate(url, 60)
                ));
            }
        }

        // Records left behind by products no longer tracked.
        let tracked: Vec<String> = self.config.urls.iter().map(|u| ledger::slug(u)).collect();
        let orphans: Vec<_> =
            ledger.entries()?.into_iter().filter(|(slug, _)| !tracked.contains(slug)).collect();

        if !orphans.is_empty() {
            lines.push(String::new());
            lines.push(format!("Untracked records in {}:", ledger.dir().display()));
            for (slug, price) in orphans {
                lines.push(format!("  {:<14} {}", format.maybe_price(price), slug));
            }
        }

        Ok(lines.join("\n"))
    }
}

/// Summarizes which settings and credentials are present, masking secrets.
pub fn config_report(config: &Config) -> String {
    fn present(value: &Option<String>) -> &'static str {
        if value.is_some() {
            "✔️"
        } else {
            "❌"
        }
    }

    let mut lines = vec![
        format!("TELEGRAM_TOKEN:       {}", present(&config.telegram.token)),
        format!("TELEGRAM_CHAT_ID:     {}", present(&config.telegram.chat_id)),
        format!("EMAIL_USER:           {}", config.email.username.as_deref().unwrap_or("❌")),
        format!("EMAIL_PASS:           {}", present(&config.email.password)),
        format!("EMAIL_TO:             {}", config.email.to.as_deref().unwrap_or("❌")),
        format!("SMTP:                 {}:{}", config.email.smtp_host, config.email.smtp_port),
        format!("DEBUG_MODE:           {}", config.debug_mode),
        format!("SEND_NOTIFICATIONS:   {}", config.always_notify),
        format!("SEND_STATUS_TELEGRAM: {}", config.send_status_updates),
        format!("Timezone:             {}", config.timezone),
        format!("Data directory:       {}", config.data_dir.display()),
    ];

    if config.monitor_times.is_empty() {
        lines.push(format!("Monitor schedule:     every {}h", config.monitor_interval_hours));
    } else {
        lines.push(format!("Monitor schedule:     {}", config.monitor_times.join(", ")));
    }

    lines.push(String::new());
    lines.push(format!("🛒 Products to monitor: {} found", config.urls.len()));
    for (i, url) in config.urls.iter().enumerate() {
        lines.push(format!("  {}. {}", i + 1, truncate(url, 80)));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::Price;
    use tempfile::TempDir;

    fn make_config(urls: &[&str]) -> Config {
        Config { urls: urls.iter().map(|u| u.to_string()).collect(), ..Config::default() }
    }

    #[test]
    fn test_status_lists_prices() {
        let dir = TempDir::new().unwrap();
        let ledger = Ledger::open(dir.path()).unwrap();
        ledger.write("https://a.com/1", Price::from_cents(19990)).unwrap();

        let cmd = StatusCommand::new(make_config(&["https://a.com/1", "https://b.com/2"]));
        let output = cmd.execute_with_ledger(&ledger).unwrap();

        assert!(output.contains("R$ 199,90"));
        assert!(output.contains("https://a.com/1"));
        assert!(output.lines().any(|l| l.starts_with('-') && l.contains("https://b.com/2")));
        assert!(!output.contains("Untracked"));
    }

    #[test]
    fn test_status_reports_orphans() {
        let dir = TempDir::new().unwrap();
        let ledger = Ledger::open(dir.path()).unwrap();
        ledger.write("https://old.com/x", Price::from_cents(500)).unwrap();

        let cmd = StatusCommand::new(make_config(&[]));
        let output = cmd.execute_with_ledger(&ledger).unwrap();

        assert!(output.contains("No products configured."));
        assert!(output.contains("Untracked records"));
        assert!(output.contains(&ledger::slug("https://old.com/x")));
        assert!(output.contains("R$ 5,00"));
    }

    #[test]
    fn test_config_report_masks_secrets() {
        let mut config = make_config(&["https://a.com/1"]);
        config.telegram.token = Some("123:supersecret".to_string());
        config.email.username = Some("me@example.com".to_string());
        config.email.password = Some("hunter2".to_string());

        let report = config_report(&config);

        assert!(!report.contains("supersecret"));
        assert!(!report.contains("hunter2"));
        assert!(report.contains("me@example.com"));
        assert!(report.contains("TELEGRAM_CHAT_ID:     ❌"));
        assert!(report.contains("every 6h"));
        assert!(report.contains("1 found"));
        assert!(report.contains("  1. https://a.com/1"));
    }
}
