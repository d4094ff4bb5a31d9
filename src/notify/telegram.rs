//! Telegram Bot API notifier.

use crate::config::TelegramConfig;
use crate::error::NotificationError;
use crate::notify::{Channel, Notifier};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use wreq::Client;

pub struct TelegramNotifier {
    client: Client,
    endpoint: String,
    chat_id: String,
}

/// Error envelope returned by the Bot API.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let token = config.token.as_deref().context("TELEGRAM_TOKEN is not set")?;
        let chat_id = config.chat_id.clone().context("TELEGRAM_CHAT_ID is not set")?;

        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to build Telegram HTTP client")?;

        let endpoint = format!("{}/bot{}/sendMessage", config.api_base.trim_end_matches('/'), token);

        Ok(Self { client, endpoint, chat_id })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn channel(&self) -> Channel {
        Channel::Telegram
    }

    async fn send(&self, _subject: &str, body: &str) -> Result<(), NotificationError> {
        let payload = serde_json::json!({
            "chat_id": self.chat_id,
            "text": body,
        });

        debug!("Sending Telegram message to chat {}", self.chat_id);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .body(payload.to_string())
            .send()
            .await
            .map_err(|e| NotificationError::Telegram(e.to_string()))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        let api: Option<ApiResponse> = serde_json::from_str(&text).ok();
        match api {
            Some(ApiResponse { ok: true, .. }) if status.is_success() => Ok(()),
            Some(ApiResponse { description: Some(description), .. }) => Err(
                NotificationError::Telegram(format!("{} ({})", description, status.as_u16())),
            ),
            _ => Err(NotificationError::Telegram(format!("unexpected response status {}", status))),
        }
    }
}
