//! price-watch - product price tracker
//!
//! Scrapes product pages on a schedule, keeps the lowest price ever seen per
//! product, and alerts by e-mail and Telegram when a new minimum shows up.

pub mod commands;
pub mod config;
pub mod error;
pub mod format;
pub mod health;
pub mod ledger;
pub mod monitor;
pub mod notify;
pub mod product;
pub mod scheduler;

pub use config::Config;
pub use error::{ExtractionError, NotificationError};
pub use ledger::Ledger;
pub use product::{Price, TrackedItem};
