//! Test-message command for checking notification credentials.

use crate::config::Config;
use crate::notify::{Channel, NotificationSink};
use anyhow::{bail, Result};

const TEST_SUBJECT: &str = "🔔 price-watch test e-mail";
const TEST_BODY: &str = "🚀 price-watch test message. If you can read this, notifications work.";

/// Sends a test message through one or all channels.
pub struct NotifyCommand {
    config: Config,
}

impl NotifyCommand {
    /// Creates a new notify command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Sends through the configured transports.
    pub async fn execute(&self, channel: Option<Channel>) -> Result<String> {
        let sink = NotificationSink::from_config(&self.config)?;
        self.execute_with_sink(&sink, channel).await
    }

    /// Sends through a provided sink (for testing).
    pub async fn execute_with_sink(
        &self,
        sink: &NotificationSink,
        channel: Option<Channel>,
    ) -> Result<String> {
        let channels = match channel {
            Some(channel) => vec![channel],
            None => vec![Channel::Email, Channel::Telegram],
        };

        let report = sink.send_to(&channels, TEST_SUBJECT, TEST_BODY).await;

        if report.is_empty() {
            bail!(
                "No configured channel among: {}. Check credentials with `check-config`.",
                channels.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(", ")
            );
        }

        let mut lines: Vec<String> =
            report.delivered.iter().map(|c| format!("✅ {}: sent", c)).collect();
        lines.extend(report.failed.iter().map(|(c, e)| format!("❌ {}: {}", c, e)));

        if !report.failed.is_empty() {
            bail!("{}", lines.join("\n"));
        }

        Ok(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::testing::RecordingNotifier;

    #[tokio::test]
    async fn test_sends_to_all_channels() {
        let email = RecordingNotifier::new(Channel::Email);
        let chat = RecordingNotifier::new(Channel::Telegram);
        let sink = NotificationSink::new("x").with(email.clone()).with(chat.clone());

        let output = NotifyCommand::new(Config::default())
            .execute_with_sink(&sink, None)
            .await
            .unwrap();

        assert!(output.contains("✅ email: sent"));
        assert!(output.contains("✅ telegram: sent"));
        assert_eq!(email.sent.lock().unwrap()[0].0, TEST_SUBJECT);
        assert_eq!(chat.bodies(), vec![TEST_BODY]);
    }

    #[tokio::test]
    async fn test_single_channel() {
        let email = RecordingNotifier::new(Channel::Email);
        let chat = RecordingNotifier::new(Channel::Telegram);
        let sink = NotificationSink::new("x").with(email.clone()).with(chat.clone());

        NotifyCommand::new(Config::default())
            .execute_with_sink(&sink, Some(Channel::Telegram))
            .await
            .unwrap();

        assert!(email.bodies().is_empty());
        assert_eq!(chat.bodies().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_reported() {
        let sink = NotificationSink::new("x")
            .with(RecordingNotifier::failing(Channel::Email))
            .with(RecordingNotifier::new(Channel::Telegram));

        let err = NotifyCommand::new(Config::default())
            .execute_with_sink(&sink, None)
            .await
            .unwrap_err()
            .to_string();

        assert!(err.contains("❌ email: email delivery failed: smtp down"));
        assert!(err.contains("✅ telegram: sent"));
    }

    #[tokio::test]
    async fn test_no_configured_channel() {
        let sink = NotificationSink::new("x");
        let result = NotifyCommand::new(Config::default()).execute_with_sink(&sink, None).await;
        tokio_test::assert_err!(&result);
        assert!(result.unwrap_err().to_string().contains("No configured channel"));
    }
}
