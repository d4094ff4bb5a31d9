//! Data models for prices and tracked products.

use crate::error::PriceParseError;
use crate::ledger;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Largest price accepted, in whole currency units.
const MAX_UNITS: u64 = 1_000_000_000_000;

/// A non-negative price with two-digit precision, held as an exact number of cents.
///
/// Ordering and equality compare the numeric value, so `100.00` and `100.0`
/// are the same price. Serialized as a JSON number (`199.9`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price {
    cents: u64,
}

impl Price {
    /// Creates a price from a number of cents.
    pub fn from_cents(cents: u64) -> Self {
        Self { cents }
    }

    /// Returns the price as a number of cents.
    pub fn cents(&self) -> u64 {
        self.cents
    }

    /// Whole currency units (e.g. reais).
    pub fn units(&self) -> u64 {
        self.cents / 100
    }

    /// Sub-unit remainder (e.g. centavos).
    pub fn subunits(&self) -> u64 {
        self.cents % 100
    }

    /// Assembles a price from its displayed integer and fractional components.
    ///
    /// The fractional part defaults to `"00"`. Thousands separators inside the
    /// integer part (`1.299`, `1,299`, `1 299`) are ignored. A single fractional
    /// digit means tenths, as in `integer + "." + fraction`.
    pub fn from_parts(integer: &str, fraction: Option<&str>) -> Result<Self, PriceParseError> {
        let digits: String = integer
            .trim()
            .chars()
            .filter(|c| !matches!(c, '.' | ',' | ' ' | '\u{a0}' | '\u{202f}'))
            .collect();

        if digits.is_empty() {
            return Err(PriceParseError::MissingInteger);
        }
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(PriceParseError::InvalidDigits(integer.trim().to_string()));
        }

        let units: u64 = digits
            .parse()
            .ok()
            .filter(|u| *u <= MAX_UNITS)
            .ok_or_else(|| PriceParseError::Overflow(integer.trim().to_string()))?;

        let fraction = fraction.map(str::trim).filter(|f| !f.is_empty()).unwrap_or("00");
        if !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(PriceParseError::InvalidDigits(fraction.to_string()));
        }

        let subunits: u64 = match fraction.len() {
            1 => fraction.parse::<u64>().unwrap_or(0) * 10,
            2 => fraction.parse().unwrap_or(0),
            _ => return Err(PriceParseError::FractionTooLong(fraction.to_string())),
        };

        Ok(Self { cents: units * 100 + subunits })
    }

    /// Converts a decimal value to the nearest cent. Rejects negative, non-finite
    /// and out-of-range values.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 || value > MAX_UNITS as f64 {
            return None;
        }
        Some(Self { cents: (value * 100.0).round() as u64 })
    }

    /// Returns the price as a decimal value.
    pub fn as_f64(&self) -> f64 {
        self.cents as f64 / 100.0
    }
}

impl FromStr for Price {
    type Err = PriceParseError;

    /// Parses a dot-decimal string such as `199.90` or `1299`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().rsplit_once('.') {
            Some((integer, fraction)) => Self::from_parts(integer, Some(fraction)),
            None => Self::from_parts(s, None),
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.units(), self.subunits())
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Price::from_f64(value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid price value: {}", value)))
    }
}

/// A monitored product page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedItem {
    /// Product page URL
    pub url: String,
    /// Filesystem-safe ledger key derived from the URL
    pub slug: String,
}

impl TrackedItem {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let slug = ledger::slug(&url);
        Self { url, slug }
    }
}
