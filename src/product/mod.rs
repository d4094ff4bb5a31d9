//! Product page fetching, price parsing, and data models.

pub mod client;
pub mod models;
pub mod parser;
pub mod selectors;

pub use client::{PriceSource, ProductClient, StatusClient, StatusProbe};
pub use models::{Price, TrackedItem};
pub use parser::extract_price;
