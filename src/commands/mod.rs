//! CLI command implementations.

pub mod notify;
pub mod status;
pub mod watch;

pub use notify::NotifyCommand;
pub use status::{config_report, StatusCommand};
pub use watch::WatchCommand;
