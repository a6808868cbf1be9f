//! Offline checkout quote.
//!
//! Prices a cart exactly the way the storefront does at checkout, without a
//! running backend. Handy for checking voucher and shipping settings.
//!
//! # Usage
//!
//! ```bash
//! pawpal-cli quote --cart cart.json
//! pawpal-cli quote --cart '[{"id":1,"productId":7,"variantId":9,"productName":"Cat tree","quantity":2,"unitPrice":450000}]' \
//!     --voucher voucher.json --shipping express --express-fee 30000 --tax-rate 8
//! ```
//!
//! `--cart` and `--voucher` take inline JSON or a path to a JSON file. The
//! cart is either an array of items or the REST cart object (`{"items": [...]}`).

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};
use pawpal_core::{
    CartItem, CheckoutQuote, PricingError, PricingPolicy, ShippingMethod, Voucher, format_vnd,
    quote_cart,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while quoting.
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid {what} JSON: {source}")]
    Json {
        what: &'static str,
        source: serde_json::Error,
    },

    #[error("{0} must not be negative")]
    Negative(&'static str),

    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Inputs for one quote.
#[derive(Debug)]
pub struct QuoteArgs {
    pub cart: String,
    pub voucher: Option<String>,
    pub shipping: ShippingMethod,
    pub standard_fee: Decimal,
    pub express_fee: Decimal,
    pub tax_rate: Decimal,
    /// Voucher validity is checked at this instant; defaults to now.
    pub at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CartInput {
    Items(Vec<CartItem>),
    Cart { items: Vec<CartItem> },
}

/// Price the cart and return the printable breakdown.
///
/// # Errors
///
/// Returns an error if an input cannot be read or parsed, a fee is
/// negative, or the amounts are too large to price.
pub fn run(args: &QuoteArgs) -> Result<String, QuoteError> {
    let policy = policy(args)?;
    let items = parse_cart(&load(&args.cart)?)?;
    let voucher = args
        .voucher
        .as_deref()
        .map(|raw| load(raw).and_then(|json| parse_voucher(&json)))
        .transpose()?;

    let now = args.at.unwrap_or_else(Utc::now);
    let quote = quote_cart(&items, voucher.as_ref(), args.shipping, &policy, now)?;
    tracing::debug!(?quote, "Quote computed");

    render(&items, voucher.as_ref(), args.shipping, &quote)
}

fn policy(args: &QuoteArgs) -> Result<PricingPolicy, QuoteError> {
    let check = |value: Decimal, name: &'static str| {
        if value.is_sign_negative() {
            Err(QuoteError::Negative(name))
        } else {
            Ok(value)
        }
    };
    Ok(PricingPolicy {
        standard_shipping_fee: check(args.standard_fee, "--standard-fee")?,
        express_shipping_fee: check(args.express_fee, "--express-fee")?,
        tax_rate_percent: check(args.tax_rate, "--tax-rate")?,
    })
}

/// Inline JSON is used as-is; anything else is read as a file path.
fn load(raw: &str) -> Result<String, QuoteError> {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        return Ok(raw.to_string());
    }
    std::fs::read_to_string(Path::new(raw)).map_err(|source| QuoteError::Read {
        path: raw.to_string(),
        source,
    })
}

/// Parse a cart given as an item array or a `{"items": [...]}` object.
///
/// # Errors
///
/// Returns `QuoteError::Json` if neither shape matches.
pub fn parse_cart(json: &str) -> Result<Vec<CartItem>, QuoteError> {
    let input: CartInput =
        serde_json::from_str(json).map_err(|source| QuoteError::Json { what: "cart", source })?;
    Ok(match input {
        CartInput::Items(items) | CartInput::Cart { items } => items,
    })
}

/// Parse a voucher.
///
/// # Errors
///
/// Returns `QuoteError::Json` if the JSON is not a voucher.
pub fn parse_voucher(json: &str) -> Result<Voucher, QuoteError> {
    serde_json::from_str(json).map_err(|source| QuoteError::Json {
        what: "voucher",
        source,
    })
}

/// Format the breakdown as aligned text.
///
/// # Errors
///
/// Returns `QuoteError::Pricing` if a line total does not fit.
pub fn render(
    items: &[CartItem],
    voucher: Option<&Voucher>,
    shipping: ShippingMethod,
    quote: &CheckoutQuote,
) -> Result<String, QuoteError> {
    let mut out = String::new();
    for item in items {
        let name = match &item.variant_label {
            Some(label) => format!("{} ({label})", item.product_name),
            None => item.product_name.clone(),
        };
        let _ = writeln!(
            out,
            "{:>3} x {name:<40} {:>16}",
            item.quantity,
            format_vnd(item.line_total()?)
        );
    }
    let _ = writeln!(out, "{}", "-".repeat(63));

    let mut row = |label: &str, amount: String| {
        let _ = writeln!(out, "{label:<46} {amount:>16}");
    };
    row("Subtotal", format_vnd(quote.subtotal));
    match (voucher, quote.voucher_id) {
        (Some(v), Some(_)) => row(
            &format!("Voucher {} ({})", v.code, v.benefit_label()),
            format!("-{}", format_vnd(quote.discount)),
        ),
        (Some(v), None) => row(
            &format!("Voucher {} (not valid)", v.code),
            format_vnd(Decimal::ZERO),
        ),
        (None, _) => {}
    }
    row(shipping.label(), format_vnd(quote.shipping_fee));
    row("Tax", format_vnd(quote.tax));
    row("Total", format_vnd(quote.total));
    row("Amount due", format_vnd(quote.amount_due()));
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    const CART: &str = r#"[
        {"id": 1, "productId": 7, "variantId": 9, "productName": "Cat tree",
         "variantLabel": "Large", "quantity": 2, "unitPrice": 450000},
        {"id": 2, "productId": 8, "variantId": 11, "productName": "Salmon treats",
         "quantity": 3, "unitPrice": "35000"}
    ]"#;

    fn args(voucher: Option<&str>) -> QuoteArgs {
        QuoteArgs {
            cart: CART.to_string(),
            voucher: voucher.map(str::to_string),
            shipping: ShippingMethod::Express,
            standard_fee: Decimal::ZERO,
            express_fee: Decimal::from(30_000),
            tax_rate: Decimal::ZERO,
            at: Some(Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap()),
        }
    }

    #[test]
    fn test_parse_cart_accepts_both_shapes() {
        assert_eq!(parse_cart(CART).unwrap().len(), 2);
        let wrapped = format!(r#"{{"items": {CART}}}"#);
        assert_eq!(parse_cart(&wrapped).unwrap().len(), 2);
        assert!(matches!(
            parse_cart(r#"{"lines": []}"#),
            Err(QuoteError::Json { what: "cart", .. })
        ));
    }

    #[test]
    fn test_run_with_percent_voucher() {
        let voucher = r#"{"id": 3, "code": "PAW10", "discountPercent": 10}"#;
        let out = run(&args(Some(voucher))).unwrap();

        // 900,000 + 105,000 = 1,005,000; 10% = 100,500; + 30,000 shipping
        assert!(out.contains("1,005,000₫"));
        assert!(out.contains("Voucher PAW10 (-10%)"));
        assert!(out.contains("-100,500₫"));
        assert!(out.contains("Express delivery"));
        assert!(out.contains("934,500₫"));
    }

    #[test]
    fn test_expired_voucher_is_ignored() {
        let voucher = r#"{"id": 3, "code": "OLD", "discountAmount": 50000,
                          "validTo": "2026-01-01T00:00:00Z"}"#;
        let out = run(&args(Some(voucher))).unwrap();
        assert!(out.contains("Voucher OLD (not valid)"));
        assert!(out.contains("1,035,000₫"));
    }

    #[test]
    fn test_amount_due_never_negative() {
        let mut args = args(Some(r#"{"id": 4, "code": "BIG", "discountAmount": 5000000}"#));
        args.express_fee = Decimal::ZERO;
        let out = run(&args).unwrap();
        assert!(out.contains("-3,995,000₫"));
        assert!(out.lines().last().unwrap().ends_with("0₫"));
    }

    #[test]
    fn test_negative_fee_rejected() {
        let mut args = args(None);
        args.tax_rate = Decimal::from(-1);
        assert!(matches!(run(&args), Err(QuoteError::Negative("--tax-rate"))));
    }

    #[test]
    fn test_oversized_cart_is_an_error() {
        let mut args = args(None);
        args.cart = r#"[{"id": 1, "productId": 7, "variantId": 9, "productName": "Gold bowl",
                        "quantity": 3, "unitPrice": "39614081257132168796771975168"}]"#
            .to_string();
        assert!(matches!(
            run(&args),
            Err(QuoteError::Pricing(PricingError::Overflow))
        ));
    }

    #[test]
    fn test_missing_file() {
        let mut args = args(None);
        args.cart = "/nonexistent/cart.json".to_string();
        assert!(matches!(run(&args), Err(QuoteError::Read { .. })));
    }
}
