//! Health check cycle: hourly reachability ping of every tracked URL.

use crate::format;
use crate::notify::NotificationSink;
use crate::product::StatusProbe;
use chrono::Utc;
use chrono_tz::Tz;
use tracing::{error, info, warn};

/// Reachability result for one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// 2xx response
    Reachable(u16),
    /// Any other status
    BadStatus(u16),
    /// Transport error or timeout
    Unreachable(String),
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, HealthStatus::Reachable(_))
    }
}

pub struct HealthCheck {
    probe: Box<dyn StatusProbe>,
    urls: Vec<String>,
    send_status_updates: bool,
    tz: Tz,
}

impl HealthCheck {
    pub fn new(
        probe: impl StatusProbe + 'static,
        urls: &[String],
        send_status_updates: bool,
        tz: Tz,
    ) -> Self {
        Self { probe: Box::new(probe), urls: urls.to_vec(), send_status_updates, tz }
    }

    /// Probes every URL once. Results are logged, and sent through the chat
    /// channel when status updates are enabled.
    pub async fn run_cycle(&self, sink: &NotificationSink) -> Vec<(String, HealthStatus)> {
        let mut results = Vec::with_capacity(self.urls.len());

        for url in &self.urls {
            let ts = format::timestamp(&Utc::now().with_timezone(&self.tz));

            let (status, message) = match self.probe.probe(url).await {
                Ok(code) if (200..300).contains(&code) => {
                    let message = format::health_ok(&ts, url, code);
                    info!("{}", message);
                    (HealthStatus::Reachable(code), message)
                }
                Ok(code) => {
                    let message = format::health_bad_status(&ts, url, code);
                    warn!("{}", message);
                    (HealthStatus::BadStatus(code), message)
                }
                Err(e) => {
                    let message = format::health_error(&ts, url, &e);
                    error!("{}", message);
                    (HealthStatus::Unreachable(e.to_string()), message)
                }
            };

            if self.send_status_updates {
                sink.send_chat_message(&message).await;
            }

            results.push((url.clone(), status));
        }

        results
    }
}
