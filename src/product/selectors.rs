//! CSS selectors for product page price markup.
//!
//! The price is rendered as two sibling spans: the whole-unit fraction
//! (`andes-money-amount__fraction`) and the optional cents part
//! (`andes-money-amount__cents`). Update this file when the markup changes.

use scraper::Selector;
use std::sync::LazyLock;

/// Main price block on the product detail page. The current price lives in
/// its second line; the first line holds the crossed-out original price.
pub static PRICE_CONTAINER: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        ".ui-pdp-price__second-line, \
         .ui-pdp-price__main-container",
    )
    .unwrap()
});

/// Whole currency units (reais).
pub static PRICE_FRACTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.andes-money-amount__fraction").unwrap());

/// Sub-units (centavos). Absent for round prices.
pub static PRICE_CENTS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.andes-money-amount__cents").unwrap());

/// Money amount wrapper, used to keep fraction and cents from the same amount.
pub static MONEY_AMOUNT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".andes-money-amount").unwrap());

/// Crossed-out previous price. Amounts inside it are never the current price.
pub static PREVIOUS_PRICE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("s.andes-money-amount--previous").unwrap());
