//! HTML parser extracting the displayed price from a product page.

use crate::error::ExtractionError;
use crate::product::models::Price;
use crate::product::selectors::{
    MONEY_AMOUNT, PRICE_CENTS, PRICE_CONTAINER, PRICE_FRACTION, PREVIOUS_PRICE,
};
use scraper::{ElementRef, Html};
use tracing::{debug, trace};

/// Extracts the current price from a product page.
///
/// Looks inside the main price block first, then at any non-crossed-out
/// amount on the page, and finally at the first loose fraction/cents spans.
pub fn extract_price(html: &str) -> Result<Price, ExtractionError> {
    let document = Html::parse_document(html);

    let (integer, fraction) = document
        .select(&PRICE_CONTAINER)
        .find_map(|container| first_current_amount(container.select(&MONEY_AMOUNT)))
        .or_else(|| first_current_amount(document.select(&MONEY_AMOUNT)))
        .or_else(|| loose_parts(&document))
        .ok_or(ExtractionError::MissingPrice)?;

    trace!("Price components: integer={:?} fraction={:?}", integer, fraction);

    let price = Price::from_parts(&integer, fraction.as_deref())?;
    debug!("Extracted price {}", price);
    Ok(price)
}

/// Picks the first amount that is not a crossed-out previous price.
fn first_current_amount<'a>(
    amounts: impl Iterator<Item = ElementRef<'a>>,
) -> Option<(String, Option<String>)> {
    amounts.filter(|amount| !is_previous_price(*amount)).find_map(amount_parts)
}

fn is_previous_price(amount: ElementRef) -> bool {
    PREVIOUS_PRICE.matches(&amount)
        || amount.ancestors().filter_map(ElementRef::wrap).any(|a| PREVIOUS_PRICE.matches(&a))
}

/// Integer and fractional text of one money amount.
fn amount_parts(amount: ElementRef) -> Option<(String, Option<String>)> {
    let integer = amount.select(&PRICE_FRACTION).next().map(text)?;
    let fraction = amount.select(&PRICE_CENTS).next().map(text);
    Some((integer, fraction))
}

/// First fraction and cents spans anywhere in the document.
fn loose_parts(document: &Html) -> Option<(String, Option<String>)> {
    let integer = document.select(&PRICE_FRACTION).next().map(text)?;
    let fraction = document.select(&PRICE_CENTS).next().map(text);
    Some((integer, fraction))
}

fn text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PriceParseError;

    fn amount(integer: &str, cents: Option<&str>) -> String {
        let cents = cents
            .map(|c| format!(r#"<span class="andes-money-amount__cents">{}</span>"#, c))
            .unwrap_or_default();
        format!(
            r#"<span class="andes-money-amount"><span class="andes-money-amount__currency-symbol">R$</span><span class="andes-money-amount__fraction">{}</span>{}</span>"#,
            integer, cents
        )
    }

    #[test]
    fn test_extract_simple_price() {
        let html = format!("<html><body>{}</body></html>", amount("199", Some("90")));
        assert_eq!(extract_price(&html).unwrap(), Price::from_cents(19990));
    }

    #[test]
    fn test_extract_price_without_cents() {
        let html = format!("<html><body>{}</body></html>", amount("1.299", None));
        assert_eq!(extract_price(&html).unwrap(), Price::from_cents(129900));
    }

    #[test]
    fn test_prefers_main_price_block() {
        let html = format!(
            r#"<html><body>
                <div class="carousel">{}</div>
                <div class="ui-pdp-price__main-container">
                    <s class="andes-money-amount andes-money-amount--previous">
                        <span class="andes-money-amount__fraction">2.499</span>
                    </s>
                    <div class="ui-pdp-price__second-line">{}</div>
                </div>
            </body></html>"#,
            amount("10", Some("00")),
            amount("1.899", Some("90")),
        );
        assert_eq!(extract_price(&html).unwrap(), Price::from_cents(189990));
    }

    #[test]
    fn test_skips_previous_price_outside_block() {
        let html = format!(
            r#"<html><body>
                <s class="andes-money-amount andes-money-amount--previous">
                    <span class="andes-money-amount__fraction">300</span>
                </s>
                {}
            </body></html>"#,
            amount("250", Some("50")),
        );
        assert_eq!(extract_price(&html).unwrap(), Price::from_cents(25050));
    }

    #[test]
    fn test_loose_spans_fallback() {
        let html = r#"<html><body>
            <span class="andes-money-amount__fraction">75</span>
            <span class="andes-money-amount__cents">5</span>
        </body></html>"#;
        assert_eq!(extract_price(html).unwrap(), Price::from_cents(7550));
    }

    #[test]
    fn test_missing_price() {
        let html = "<html><body><h1>Produto indisponível</h1></body></html>";
        assert!(matches!(extract_price(html), Err(ExtractionError::MissingPrice)));
    }

    #[test]
    fn test_unparseable_price() {
        let html = format!("<html><body>{}</body></html>", amount("Grátis", None));
        assert!(matches!(
            extract_price(&html),
            Err(ExtractionError::Parse(PriceParseError::InvalidDigits(_)))
        ));
    }

    #[test]
    fn test_empty_document() {
        assert!(matches!(extract_price(""), Err(ExtractionError::MissingPrice)));
    }
}
