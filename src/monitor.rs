//! Monitor cycle: read every tracked price, keep the ledger at the lowest
//! value seen, and notify on new minimums.

use crate::config::Config;
use crate::error::ExtractionError;
use crate::format::PriceFormat;
use crate::ledger::Ledger;
use crate::notify::{Channel, NotificationSink};
use crate::product::{Price, PriceSource, TrackedItem};
use tracing::{error, info};

/// E-mail subject for informational notices.
const INFORMATIONAL_SUBJECT: &str = "ℹ️ Price update";

/// What to do with a price reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Strictly below the recorded minimum: record it and alert.
    NewMinimum,
    /// Not a new minimum, but every reading is reported.
    Informational,
    NoAction,
}

/// Decides how to react to `reading` given the recorded `lowest` (absent means +infinity).
pub fn decide(reading: Price, lowest: Option<Price>, notify_every_reading: bool) -> Decision {
    let is_new_minimum = lowest.map_or(true, |lowest| reading < lowest);

    if is_new_minimum {
        Decision::NewMinimum
    } else if notify_every_reading {
        Decision::Informational
    } else {
        Decision::NoAction
    }
}

/// Flags controlling the monitor's notifications.
#[derive(Debug, Clone, Default)]
pub struct MonitorSettings {
    pub debug_mode: bool,
    pub always_notify: bool,
    /// Informational notices also go out by e-mail
    pub informational_email: bool,
    pub format: PriceFormat,
}

impl MonitorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            debug_mode: config.debug_mode,
            always_notify: config.always_notify,
            informational_email: config.informational_email,
            format: PriceFormat::from_config(config),
        }
    }

    fn notify_every_reading(&self) -> bool {
        self.debug_mode || self.always_notify
    }

    fn informational_channels(&self) -> &'static [Channel] {
        if self.informational_email {
            &[Channel::Email, Channel::Telegram]
        } else {
            &[Channel::Telegram]
        }
    }
}

/// Result of processing one item.
#[derive(Debug)]
pub enum ItemOutcome {
    /// The price could not be read; nothing changed.
    Skipped(ExtractionError),
    NewMinimum { price: Price, previous: Option<Price> },
    Informational { price: Price, lowest: Price },
    Unchanged { price: Price, lowest: Price },
}

/// Outcomes of one monitor cycle, in item order.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub outcomes: Vec<(String, ItemOutcome)>,
}

impl CycleReport {
    pub fn new_minimums(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::NewMinimum { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Skipped(_)))
    }

    fn count(&self, f: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| f(o)).count()
    }
}

/// Runs monitor cycles over a fixed list of tracked items.
///
/// The monitor owns the ledger; cycles take `&mut self`, so two cycles can
/// never run against the same ledger at once.
pub struct Monitor {
    source: Box<dyn PriceSource>,
    ledger: Ledger,
    settings: MonitorSettings,
    items: Vec<TrackedItem>,
}

impl Monitor {
    pub fn new(
        source: impl PriceSource + 'static,
        ledger: Ledger,
        settings: MonitorSettings,
        urls: &[String],
    ) -> Self {
        let items = urls.iter().map(TrackedItem::new).collect();
        Self { source: Box::new(source), ledger, settings, items }
    }

    pub fn items(&self) -> &[TrackedItem] {
        &self.items
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Processes every tracked item once, in order. Never fails: extraction
    /// and delivery errors are logged and recorded in the report.
    pub async fn run_cycle(&mut self, sink: &NotificationSink) -> CycleReport {
        info!("🔎 Checking prices for {} item(s)", self.items.len());

        let mut report = CycleReport::default();
        for index in 0..self.items.len() {
            let outcome = self.check_item(index, sink).await;
            report.outcomes.push((self.items[index].url.clone(), outcome));
        }

        info!(
            "Price check finished: {} new minimum(s), {} skipped",
            report.new_minimums(),
            report.skipped()
        );
        report
    }

    async fn check_item(&mut self, index: usize, sink: &NotificationSink) -> ItemOutcome {
        let url = self.items[index].url.clone();

        let price = match self.source.fetch_price(&url).await {
            Ok(price) => price,
            Err(e) => {
                error!("Failed to read price from {}: {}", url, e);
                return ItemOutcome::Skipped(e);
            }
        };

        let lowest = self.ledger.read(&url);
        let format = &self.settings.format;
        info!(
            "Current price for {}: {} | lowest recorded: {}",
            url,
            format.price(price),
            format.maybe_price(lowest)
        );

        match decide(price, lowest, self.settings.notify_every_reading()) {
            Decision::NewMinimum => {
                info!("💰 New lowest price for {}!", url);
                if let Err(e) = self.ledger.write(&url, price) {
                    error!("Failed to record lowest price for {}: {:#}", url, e);
                }
                let message = format.new_minimum(&url, price, lowest);
                sink.broadcast(&message).await;
                ItemOutcome::NewMinimum { price, previous: lowest }
            }
            Decision::Informational => {
                // A non-new-minimum reading implies a recorded value exists.
                let lowest = lowest.unwrap_or(price);
                let message = format.informational(&url, price, Some(lowest));
                sink.send_to(self.settings.informational_channels(), INFORMATIONAL_SUBJECT, &message)
                    .await;
                ItemOutcome::Informational { price, lowest }
            }
            Decision::NoAction => ItemOutcome::Unchanged { price, lowest: lowest.unwrap_or(price) },
        }
    }
}
