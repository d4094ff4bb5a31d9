//! Typed failures raised at the collaborator seams (page fetching and notification delivery).

use thiserror::Error;

/// Why a price string could not be turned into a [`crate::Price`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceParseError {
    #[error("integer part is empty")]
    MissingInteger,

    #[error("invalid digits in {0:?}")]
    InvalidDigits(String),

    #[error("fractional part {0:?} has more than two digits")]
    FractionTooLong(String),

    #[error("price {0:?} is out of range")]
    Overflow(String),
}

/// Broad classification of an extraction failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Parse,
}

/// Failure to obtain a price reading (or a reachability status) for a URL.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("price element not found on page")]
    MissingPrice,

    #[error("unparseable price: {0}")]
    Parse(#[from] PriceParseError),
}

impl ExtractionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ExtractionError::Network(_) | ExtractionError::Status(_) => FailureKind::Network,
            ExtractionError::MissingPrice | ExtractionError::Parse(_) => FailureKind::Parse,
        }
    }
}

impl From<wreq::Error> for ExtractionError {
    fn from(err: wreq::Error) -> Self {
        ExtractionError::Network(err.to_string())
    }
}

/// Failure to deliver a message through one notification channel.
#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("email delivery failed: {0}")]
    Email(String),

    #[error("telegram delivery failed: {0}")]
    Telegram(String),
}
