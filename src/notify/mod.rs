//! Notification delivery over e-mail and Telegram.
//!
//! Each channel fails on its own: the sink always attempts every channel it
//! was asked to use and reports per-channel outcomes instead of stopping at
//! the first error.

pub mod email;
pub mod telegram;

use crate::config::Config;
use crate::error::NotificationError;
use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use tracing::{error, info, warn};

pub use email::EmailNotifier;
pub use telegram::TelegramNotifier;

/// Delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Email,
    Telegram,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Email => write!(f, "email"),
            Channel::Telegram => write!(f, "telegram"),
        }
    }
}

impl std::str::FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "email" | "e-mail" | "mail" => Ok(Channel::Email),
            "telegram" | "chat" => Ok(Channel::Telegram),
            _ => Err(format!("Unknown channel: {}. Use: email, telegram", s)),
        }
    }
}

/// A single delivery transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel this notifier delivers through.
    fn channel(&self) -> Channel;

    /// Delivers one message. Chat transports ignore the subject.
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotificationError>;
}

/// Per-channel outcome of one notification.
#[derive(Debug, Default)]
pub struct DeliveryReport {
    pub delivered: Vec<Channel>,
    pub failed: Vec<(Channel, NotificationError)>,
}

impl DeliveryReport {
    /// True when at least one channel was attempted and none failed.
    pub fn is_success(&self) -> bool {
        !self.delivered.is_empty() && self.failed.is_empty()
    }

    /// True when no channel was attempted.
    pub fn is_empty(&self) -> bool {
        self.delivered.is_empty() && self.failed.is_empty()
    }

    fn merge(&mut self, other: DeliveryReport) {
        self.delivered.extend(other.delivered);
        self.failed.extend(other.failed);
    }
}

/// Fans messages out to the configured notifiers.
pub struct NotificationSink {
    subject: String,
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotificationSink {
    /// Creates an empty sink; messages sent to it go nowhere.
    pub fn new(subject: impl Into<String>) -> Self {
        Self { subject: subject.into(), notifiers: Vec::new() }
    }

    /// Adds a notifier.
    pub fn with(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifiers.push(Box::new(notifier));
        self
    }

    /// Builds the sink from the configured credentials. Channels without
    /// credentials are left out.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut sink = Self::new(config.email.subject.clone());

        if config.email.is_configured() {
            sink = sink.with(EmailNotifier::new(&config.email)?);
        } else {
            warn!("E-mail credentials not configured, e-mail notifications disabled");
        }

        if config.telegram.is_configured() {
            sink = sink.with(TelegramNotifier::new(&config.telegram)?);
        } else {
            warn!("Telegram credentials not configured, chat notifications disabled");
        }

        Ok(sink)
    }

    /// Channels this sink can deliver to.
    pub fn channels(&self) -> Vec<Channel> {
        self.notifiers.iter().map(|n| n.channel()).collect()
    }

    /// Sends an e-mail with the given subject.
    pub async fn send_email(&self, subject: &str, body: &str) -> DeliveryReport {
        self.send_to(&[Channel::Email], subject, body).await
    }

    /// Sends a chat message.
    pub async fn send_chat_message(&self, text: &str) -> DeliveryReport {
        self.send_to(&[Channel::Telegram], &self.subject, text).await
    }

    /// Sends through every channel, e-mail and chat independently.
    pub async fn broadcast(&self, body: &str) -> DeliveryReport {
        let mut report = self.send_email(&self.subject, body).await;
        report.merge(self.send_chat_message(body).await);
        report
    }

    /// Sends through the listed channels. A failure on one channel never
    /// prevents the others from being attempted.
    pub async fn send_to(&self, channels: &[Channel], subject: &str, body: &str) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for notifier in self.notifiers.iter().filter(|n| channels.contains(&n.channel())) {
            let channel = notifier.channel();
            match notifier.send(subject, body).await {
                Ok(()) => {
                    info!("✅ Notification sent via {}", channel);
                    report.delivered.push(channel);
                }
                Err(e) => {
                    error!("❌ Failed to send notification via {}: {}", channel, e);
                    report.failed.push((channel, e));
                }
            }
        }

        report
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingNotifier;
    use super::*;

    #[tokio::test]
    async fn test_broadcast_reaches_all_channels() {
        let email = RecordingNotifier::new(Channel::Email);
        let chat = RecordingNotifier::new(Channel::Telegram);
        let sink = NotificationSink::new("Alert").with(email.clone()).with(chat.clone());

        let report = sink.broadcast("hello").await;

        assert!(report.is_success());
        assert_eq!(report.delivered, vec![Channel::Email, Channel::Telegram]);
        assert_eq!(email.sent.lock().unwrap()[0], ("Alert".to_string(), "hello".to_string()));
        assert_eq!(chat.bodies(), vec!["hello"]);
    }

    #[tokio::test]
    async fn test_email_failure_does_not_block_chat() {
        let email = RecordingNotifier::failing(Channel::Email);
        let chat = RecordingNotifier::new(Channel::Telegram);
        let sink = NotificationSink::new("Alert").with(email.clone()).with(chat.clone());

        let report = sink.broadcast("hello").await;

        assert!(!report.is_success());
        assert_eq!(report.delivered, vec![Channel::Telegram]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, Channel::Email);
        assert_eq!(chat.bodies(), vec!["hello"]);
    }

    #[tokio::test]
    async fn test_chat_failure_does_not_block_email() {
        let chat = RecordingNotifier::failing(Channel::Telegram);
        let email = RecordingNotifier::new(Channel::Email);
        let sink = NotificationSink::new("Alert").with(chat.clone()).with(email.clone());

        let report = sink.broadcast("hello").await;

        assert_eq!(report.delivered, vec![Channel::Email]);
        assert_eq!(report.failed[0].0, Channel::Telegram);
        assert_eq!(email.bodies(), vec!["hello"]);
        assert_eq!(chat.bodies(), vec!["hello"]);
    }

    #[tokio::test]
    async fn test_chat_only() {
        let email = RecordingNotifier::new(Channel::Email);
        let chat = RecordingNotifier::new(Channel::Telegram);
        let sink = NotificationSink::new("Alert").with(email.clone()).with(chat.clone());

        let report = sink.send_chat_message("status").await;

        assert_eq!(report.delivered, vec![Channel::Telegram]);
        assert!(email.bodies().is_empty());
    }

    #[tokio::test]
    async fn test_empty_sink() {
        let sink = NotificationSink::new("Alert");
        let report = sink.broadcast("nobody listens").await;
        assert!(report.is_empty());
        assert!(!report.is_success());
        assert!(sink.channels().is_empty());
    }

    #[test]
    fn test_from_config_skips_unconfigured() {
        let sink = NotificationSink::from_config(&Config::default()).unwrap();
        assert!(sink.channels().is_empty());
    }

    #[test]
    fn test_channel_parsing() {
        assert_eq!("email".parse::<Channel>().unwrap(), Channel::Email);
        assert_eq!("Telegram".parse::<Channel>().unwrap(), Channel::Telegram);
        assert_eq!("chat".parse::<Channel>().unwrap(), Channel::Telegram);
        assert!("pigeon".parse::<Channel>().unwrap_err().contains("Unknown channel"));
        assert_eq!(Channel::Email.to_string(), "email");
    }
}
