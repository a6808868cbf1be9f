//! Checkout pricing: subtotal, voucher discount, shipping, tax and total.
//!
//! Everything here is pure. The storefront recomputes a [`CheckoutQuote`]
//! on every checkout render and again right before submitting the order, so
//! the amount sent to the backend always matches the current cart, voucher
//! and shipping method.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::types::{CartItem, ShippingMethod, Voucher, VoucherId};

/// A cart whose amounts do not fit in a [`Decimal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("The order total is too large to process")]
    Overflow,
}

fn checked(amount: Option<Decimal>) -> Result<Decimal, PricingError> {
    amount.ok_or(PricingError::Overflow)
}

/// Round to whole đồng, half away from zero.
#[must_use]
pub fn round_vnd(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// The parts of a cart line that affect price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineAmount {
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl LineAmount {
    /// quantity × unit price.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the product does not fit.
    pub fn total(&self) -> Result<Decimal, PricingError> {
        checked(Decimal::from(self.quantity).checked_mul(self.unit_price))
    }
}

impl From<&CartItem> for LineAmount {
    fn from(item: &CartItem) -> Self {
        Self {
            quantity: item.quantity,
            unit_price: item.unit_price,
        }
    }
}

/// Shipping fees and tax rate applied at checkout.
///
/// The default policy charges nothing for shipping or tax.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PricingPolicy {
    pub standard_shipping_fee: Decimal,
    pub express_shipping_fee: Decimal,
    pub tax_rate_percent: Decimal,
}

impl PricingPolicy {
    #[must_use]
    pub const fn shipping_fee(&self, method: ShippingMethod) -> Decimal {
        match method {
            ShippingMethod::Standard => self.standard_shipping_fee,
            ShippingMethod::Express => self.express_shipping_fee,
        }
    }

    /// Tax on the discounted subtotal. Never negative.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the tax does not fit.
    pub fn tax(&self, taxable: Decimal) -> Result<Decimal, PricingError> {
        if self.tax_rate_percent.is_zero() || taxable <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }
        percent_of(taxable, self.tax_rate_percent)
    }
}

impl Voucher {
    /// Whether the voucher can be redeemed at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.used
            && self.valid_from.is_none_or(|from| now >= from)
            && self.valid_to.is_none_or(|to| now <= to)
    }

    /// Discount this voucher grants on `subtotal`, ignoring validity.
    ///
    /// A positive fixed amount wins over a percentage.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the percentage does not fit.
    pub fn discount_for(&self, subtotal: Decimal) -> Result<Decimal, PricingError> {
        if let Some(amount) = self.discount_amount.filter(|a| *a > Decimal::ZERO) {
            return Ok(amount);
        }
        if let Some(percent) = self.discount_percent.filter(|p| *p > Decimal::ZERO) {
            return percent_of(subtotal, percent);
        }
        Ok(Decimal::ZERO)
    }

    /// Short description of the benefit, e.g. `-10%` or `-50,000₫`.
    #[must_use]
    pub fn benefit_label(&self) -> String {
        if let Some(amount) = self.discount_amount.filter(|a| *a > Decimal::ZERO) {
            return format!("-{}", crate::types::format_vnd(amount));
        }
        if let Some(percent) = self.discount_percent.filter(|p| *p > Decimal::ZERO) {
            return format!("-{}%", percent.normalize());
        }
        String::new()
    }
}

/// `amount × percent / 100`, rounded to whole đồng.
fn percent_of(amount: Decimal, percent: Decimal) -> Result<Decimal, PricingError> {
    let scaled = checked(amount.checked_mul(percent))?;
    Ok(round_vnd(checked(scaled.checked_div(Decimal::ONE_HUNDRED))?))
}

/// Price breakdown shown on the checkout page and sent with the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutQuote {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping_fee: Decimal,
    pub tax: Decimal,
    /// `subtotal + shipping_fee + tax - discount`; may be negative when a
    /// fixed voucher exceeds the cart value.
    pub total: Decimal,
    /// The voucher that produced `discount`, if any was valid.
    pub voucher_id: Option<VoucherId>,
}

impl CheckoutQuote {
    /// What the customer is actually charged.
    #[must_use]
    pub fn amount_due(&self) -> Decimal {
        self.total.max(Decimal::ZERO)
    }

    /// The part of `discount` that is actually taken off: never more than
    /// subtotal, shipping and tax together, so that
    /// `subtotal + shipping_fee + tax - charged_discount() == amount_due()`.
    #[must_use]
    pub fn charged_discount(&self) -> Decimal {
        self.discount + self.total.min(Decimal::ZERO)
    }
}

/// Σ quantity × unit price.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if a line or the sum does not fit.
pub fn subtotal(lines: &[LineAmount]) -> Result<Decimal, PricingError> {
    lines.iter().try_fold(Decimal::ZERO, |sum, line| {
        checked(sum.checked_add(line.total()?))
    })
}

/// Compute the checkout breakdown.
///
/// Expired or used vouchers are ignored rather than rejected: they simply
/// contribute no discount.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if any amount does not fit.
pub fn quote(
    lines: &[LineAmount],
    voucher: Option<&Voucher>,
    shipping: ShippingMethod,
    policy: &PricingPolicy,
    now: DateTime<Utc>,
) -> Result<CheckoutQuote, PricingError> {
    let subtotal = subtotal(lines)?;
    let applied = voucher.filter(|v| v.is_valid_at(now));
    let discount = applied.map_or(Ok(Decimal::ZERO), |v| v.discount_for(subtotal))?;
    let shipping_fee = policy.shipping_fee(shipping);
    let tax = policy.tax(checked(subtotal.checked_sub(discount))?)?;
    let gross = checked(subtotal.checked_add(shipping_fee))?;
    let gross = checked(gross.checked_add(tax))?;

    Ok(CheckoutQuote {
        subtotal,
        discount,
        shipping_fee,
        tax,
        total: checked(gross.checked_sub(discount))?,
        voucher_id: applied.map(|v| v.id),
    })
}

/// [`quote`] over cart items.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if any amount does not fit.
pub fn quote_cart(
    items: &[CartItem],
    voucher: Option<&Voucher>,
    shipping: ShippingMethod,
    policy: &PricingPolicy,
    now: DateTime<Utc>,
) -> Result<CheckoutQuote, PricingError> {
    let lines: Vec<LineAmount> = items.iter().map(LineAmount::from).collect();
    quote(&lines, voucher, shipping, policy, now)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
    }

    fn lines() -> Vec<LineAmount> {
        vec![
            LineAmount {
                quantity: 2,
                unit_price: Decimal::from(100_000),
            },
            LineAmount {
                quantity: 1,
                unit_price: Decimal::from(50_000),
            },
        ]
    }

    fn voucher(amount: Option<i64>, percent: Option<i64>) -> Voucher {
        Voucher {
            id: VoucherId::new(9),
            code: "PAW10".to_string(),
            description: None,
            discount_amount: amount.map(Decimal::from),
            discount_percent: percent.map(Decimal::from),
            valid_from: Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()),
            valid_to: Some(Utc.with_ymd_and_hms(2026, 12, 31, 0, 0, 0).unwrap()),
            used: false,
        }
    }

    fn standard(lines: &[LineAmount], voucher: Option<&Voucher>) -> CheckoutQuote {
        quote(
            lines,
            voucher,
            ShippingMethod::Standard,
            &PricingPolicy::default(),
            now(),
        )
        .unwrap()
    }

    #[test]
    fn test_percent_voucher_example() {
        let v = voucher(None, Some(10));
        let q = standard(&lines(), Some(&v));
        assert_eq!(q.subtotal, Decimal::from(250_000));
        assert_eq!(q.discount, Decimal::from(25_000));
        assert_eq!(q.total, Decimal::from(225_000));
        assert_eq!(q.voucher_id, Some(VoucherId::new(9)));
    }

    #[test]
    fn test_fixed_amount_wins_regardless_of_subtotal() {
        let v = voucher(Some(30_000), Some(50));
        let q = standard(&lines(), Some(&v));
        assert_eq!(q.discount, Decimal::from(30_000));
        assert_eq!(q.charged_discount(), Decimal::from(30_000));

        let tiny = [LineAmount {
            quantity: 1,
            unit_price: Decimal::from(10_000),
        }];
        let q = standard(&tiny, Some(&v));
        assert_eq!(q.discount, Decimal::from(30_000));
        assert_eq!(q.total, Decimal::from(-20_000));
        assert_eq!(q.amount_due(), Decimal::ZERO);
    }

    #[test]
    fn test_charged_discount_never_exceeds_cart() {
        let policy = PricingPolicy {
            standard_shipping_fee: Decimal::from(5_000),
            express_shipping_fee: Decimal::ZERO,
            tax_rate_percent: Decimal::ZERO,
        };
        let v = voucher(Some(30_000), None);
        let tiny = [LineAmount {
            quantity: 1,
            unit_price: Decimal::from(10_000),
        }];
        let q = quote(&tiny, Some(&v), ShippingMethod::Standard, &policy, now()).unwrap();

        assert_eq!(q.charged_discount(), Decimal::from(15_000));
        assert_eq!(
            q.subtotal + q.shipping_fee + q.tax - q.charged_discount(),
            q.amount_due()
        );
    }

    #[test]
    fn test_percent_discount_rounds_half_away_from_zero() {
        let v = voucher(None, Some(15));
        let odd = [LineAmount {
            quantity: 1,
            unit_price: Decimal::from(10_010),
        }];
        // 10,010 × 15% = 1,501.5
        let q = standard(&odd, Some(&v));
        assert_eq!(q.discount, Decimal::from(1_502));
    }

    #[test]
    fn test_expired_or_used_voucher_never_discounts() {
        let base = standard(&lines(), None);

        let mut used = voucher(Some(40_000), None);
        used.used = true;
        let mut expired = voucher(None, Some(20));
        expired.valid_to = Some(Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap());
        let mut early = voucher(None, Some(20));
        early.valid_from = Some(Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap());

        for v in [used, expired, early] {
            let q = standard(&lines(), Some(&v));
            assert_eq!(q.discount, Decimal::ZERO);
            assert_eq!(q.total, base.total);
            assert_eq!(q.voucher_id, None);
        }
    }

    #[test]
    fn test_validity_window_is_inclusive() {
        let mut starts_now = voucher(None, Some(10));
        starts_now.valid_from = Some(now());
        let mut ends_now = voucher(None, Some(10));
        ends_now.valid_to = Some(now());

        for v in [starts_now, ends_now] {
            assert!(v.is_valid_at(now()));
            let q = standard(&lines(), Some(&v));
            assert_eq!(q.discount, Decimal::from(25_000));
            assert_eq!(q.voucher_id, Some(VoucherId::new(9)));
        }

        let mut ended = voucher(None, Some(10));
        ended.valid_to = Some(now() - chrono::Duration::seconds(1));
        assert!(!ended.is_valid_at(now()));
    }

    #[test]
    fn test_overflow_is_an_error() {
        let huge = [LineAmount {
            quantity: 3,
            unit_price: Decimal::MAX / Decimal::TWO,
        }];
        assert_eq!(subtotal(&huge), Err(PricingError::Overflow));

        let near_max = [
            LineAmount {
                quantity: 1,
                unit_price: Decimal::MAX / Decimal::TWO,
            },
            LineAmount {
                quantity: 1,
                unit_price: Decimal::MAX,
            },
        ];
        assert_eq!(
            quote(
                &near_max,
                None,
                ShippingMethod::Standard,
                &PricingPolicy::default(),
                now(),
            ),
            Err(PricingError::Overflow)
        );
    }

    #[test]
    fn test_voucher_without_benefit_gives_zero() {
        let v = voucher(Some(0), None);
        assert_eq!(v.discount_for(Decimal::from(100_000)), Ok(Decimal::ZERO));
        assert_eq!(v.benefit_label(), "");
    }

    #[test]
    fn test_default_policy_charges_no_shipping_or_tax() {
        for method in ShippingMethod::ALL {
            let q = quote(&lines(), None, method, &PricingPolicy::default(), now()).unwrap();
            assert_eq!(q.shipping_fee, Decimal::ZERO);
            assert_eq!(q.tax, Decimal::ZERO);
            assert_eq!(q.total, q.subtotal);
        }
    }

    #[test]
    fn test_configured_policy_keeps_total_identity() {
        let policy = PricingPolicy {
            standard_shipping_fee: Decimal::from(20_000),
            express_shipping_fee: Decimal::from(45_000),
            tax_rate_percent: Decimal::from(8),
        };
        let v = voucher(None, Some(10));
        let q = quote(&lines(), Some(&v), ShippingMethod::Express, &policy, now()).unwrap();
        assert_eq!(q.shipping_fee, Decimal::from(45_000));
        assert_eq!(q.tax, Decimal::from(18_000));
        assert_eq!(q.total, q.subtotal + q.shipping_fee + q.tax - q.discount);
        assert_eq!(q.total, Decimal::from(288_000));
    }

    #[test]
    fn test_benefit_labels() {
        assert_eq!(voucher(Some(50_000), None).benefit_label(), "-50,000₫");
        assert_eq!(voucher(None, Some(10)).benefit_label(), "-10%");
    }
}
