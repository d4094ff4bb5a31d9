//! SMTP e-mail notifier. Port 465 uses implicit TLS; any other port (587)
//! upgrades the connection with STARTTLS.

use crate::config::EmailConfig;
use crate::error::NotificationError;
use crate::notify::{Channel, Notifier};
use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    ImplicitTls,
    StartTls,
}

impl SmtpSecurity {
    pub fn for_port(port: u16) -> Self {
        if port == 465 {
            SmtpSecurity::ImplicitTls
        } else {
            SmtpSecurity::StartTls
        }
    }
}

pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    /// Creates the notifier. Fails when credentials are missing or addresses
    /// do not parse.
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let username = config.username.clone().context("EMAIL_USER is not set")?;
        let password = config.password.clone().context("EMAIL_PASS is not set")?;
        let to = config.to.as_deref().context("EMAIL_TO is not set")?;

        let from: Mailbox =
            username.parse().with_context(|| format!("Invalid sender address: {}", username))?;
        let to: Mailbox = to.parse().with_context(|| format!("Invalid recipient address: {}", to))?;

        let security = SmtpSecurity::for_port(config.smtp_port);
        debug!("SMTP {}:{} ({:?})", config.smtp_host, config.smtp_port, security);

        let relay = match security {
            SmtpSecurity::ImplicitTls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host),
            SmtpSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            }
        };

        let transport = relay
            .with_context(|| format!("Failed to configure SMTP relay: {}", config.smtp_host))?
            .port(config.smtp_port)
            .credentials(Credentials::new(username, password))
            .build();

        Ok(Self { transport, from, to })
    }

    /// Builds the plain-text message.
    pub fn build_message(&self, subject: &str, body: &str) -> Result<Message, NotificationError> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| NotificationError::Email(e.to_string()))
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    async fn send(&self, subject: &str, body: &str) -> Result<(), NotificationError> {
        let message = self.build_message(subject, body)?;

        debug!("Sending e-mail to {}", self.to);
        self.transport.send(message).await.map_err(|e| NotificationError::Email(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config() -> EmailConfig {
        EmailConfig {
            username: Some("alerts@example.com".to_string()),
            password: Some("app-password".to_string()),
            to: Some("me@example.com".to_string()),
            ..EmailConfig::default()
        }
    }

    #[test]
    fn test_new_requires_credentials() {
        let err = EmailNotifier::new(&EmailConfig::default()).err().unwrap().to_string();
        assert!(err.contains("EMAIL_USER"));

        let config = EmailConfig { to: None, ..make_config() };
        let err = EmailNotifier::new(&config).err().unwrap().to_string();
        assert!(err.contains("EMAIL_TO"));
    }

    #[test]
    fn test_new_rejects_bad_address() {
        let config = EmailConfig { to: Some("not an address".to_string()), ..make_config() };
        let err = EmailNotifier::new(&config).err().unwrap().to_string();
        assert!(err.contains("Invalid recipient address"));
    }

    #[test]
    fn test_security_follows_port() {
        assert_eq!(SmtpSecurity::for_port(465), SmtpSecurity::ImplicitTls);
        assert_eq!(SmtpSecurity::for_port(587), SmtpSecurity::StartTls);
        assert_eq!(SmtpSecurity::for_port(25), SmtpSecurity::StartTls);
    }

    #[tokio::test]
    async fn test_new_accepts_submission_port() {
        let config = EmailConfig { smtp_port: 587, ..make_config() };
        assert!(EmailNotifier::new(&config).is_ok());
    }

    #[tokio::test]
    async fn test_build_message() {
        let notifier = EmailNotifier::new(&make_config()).unwrap();
        assert_eq!(notifier.channel(), Channel::Email);

        let message = notifier.build_message("💰 Price alert!", "R$ 199,90").unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("From: alerts@example.com"));
        assert!(raw.contains("To: me@example.com"));
        assert!(raw.contains("Content-Type: text/plain"));
    }
}
