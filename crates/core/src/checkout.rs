//! Order placement: selection validation, cart-to-order assembly and the
//! placement state machine.
//!
//! ```text
//! Idle ──start──▶ Validating ──ok──▶ Submitting ──▶ Redirect(Gateway | CodResult)
//!   ▲                 │                  │
//!   └──── alert ──────┘                  └──▶ Failed
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pricing::{CheckoutQuote, PricingError, PricingPolicy, quote_cart};
use crate::types::{
    Address, AddressId, CartItem, OrderId, PaymentMethod, ShippingMethod, VariantId, Voucher,
    VoucherId,
};

/// Why an order cannot be placed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CheckoutError {
    #[error("Please select a shipping address")]
    MissingAddress,
    #[error("Please select a payment method")]
    MissingPaymentMethod,
    #[error("The selected address no longer exists")]
    UnknownAddress(AddressId),
    #[error("Your cart is empty")]
    EmptyCart,
    #[error("The selected voucher is not available")]
    UnknownVoucher(VoucherId),
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// What the customer picked on the checkout page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSelection {
    pub address_id: Option<AddressId>,
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub shipping_method: ShippingMethod,
    pub voucher_id: Option<VoucherId>,
}

/// A selection whose references all resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSelection {
    pub address: Address,
    pub payment_method: PaymentMethod,
    pub shipping_method: ShippingMethod,
    pub voucher: Option<Voucher>,
}

/// Check a selection against the customer's addresses, vouchers and cart.
///
/// Missing choices are reported before anything is looked up.
///
/// # Errors
///
/// Returns the first [`CheckoutError`] found.
pub fn validate(
    selection: &CheckoutSelection,
    addresses: &[Address],
    vouchers: &[Voucher],
    cart: &[CartItem],
) -> Result<ValidatedSelection, CheckoutError> {
    let address_id = selection.address_id.ok_or(CheckoutError::MissingAddress)?;
    let payment_method = selection
        .payment_method
        .ok_or(CheckoutError::MissingPaymentMethod)?;
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    let address = addresses
        .iter()
        .find(|a| a.id == address_id)
        .cloned()
        .ok_or(CheckoutError::UnknownAddress(address_id))?;
    let voucher = selection
        .voucher_id
        .map(|id| {
            vouchers
                .iter()
                .find(|v| v.id == id)
                .cloned()
                .ok_or(CheckoutError::UnknownVoucher(id))
        })
        .transpose()?;

    Ok(ValidatedSelection {
        address,
        payment_method,
        shipping_method: selection.shipping_method,
        voucher,
    })
}

/// One line of an order payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub variant_id: VariantId,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
}

/// Body of `POST /payment/create-payment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub address_id: AddressId,
    pub payment_method: PaymentMethod,
    pub shipping_method: ShippingMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voucher_id: Option<VoucherId>,
    pub items: Vec<OrderLine>,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    /// Amount charged, never negative. Always equals
    /// `subtotal + shipping_fee + tax - discount`.
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

/// Assemble the order payload from a validated selection and its quote.
///
/// Only a voucher that actually produced the quote's discount is sent. A
/// discount larger than the order is sent as the part actually taken off.
#[must_use]
pub fn build_order(
    selection: &ValidatedSelection,
    cart: &[CartItem],
    quote: &CheckoutQuote,
) -> OrderRequest {
    OrderRequest {
        address_id: selection.address.id,
        payment_method: selection.payment_method,
        shipping_method: selection.shipping_method,
        voucher_id: quote.voucher_id,
        items: cart
            .iter()
            .map(|item| OrderLine {
                variant_id: item.variant_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
            .collect(),
        subtotal: quote.subtotal,
        discount: quote.charged_discount(),
        shipping_fee: quote.shipping_fee,
        tax: quote.tax,
        total: quote.amount_due(),
    }
}

/// Response of `POST /payment/create-payment`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    #[serde(default)]
    pub order_id: Option<OrderId>,
    /// Gateway URL; present for online payments.
    #[serde(default)]
    pub payment_url: Option<String>,
}

/// Where the browser goes once the order is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementRedirect {
    Gateway(String),
    CodResult { order_id: Option<OrderId> },
}

/// Everything the placement step needs besides the selection.
#[derive(Debug, Clone, Copy)]
pub struct PlacementContext<'a> {
    pub addresses: &'a [Address],
    pub vouchers: &'a [Voucher],
    pub cart: &'a [CartItem],
    pub policy: &'a PricingPolicy,
    pub now: DateTime<Utc>,
}

/// Order placement states. Transitions consume the current state; a
/// transition that does not apply returns the state unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlacementState {
    #[default]
    Idle,
    /// Validation failed; the customer stays on the page with an alert.
    Rejected(CheckoutError),
    Validating(CheckoutSelection),
    Submitting(OrderRequest),
    Redirect(PlacementRedirect),
    Failed(String),
}

impl PlacementState {
    /// Submit the form.
    #[must_use]
    pub fn start(self, selection: CheckoutSelection) -> Self {
        match self {
            Self::Idle | Self::Rejected(_) | Self::Failed(_) => Self::Validating(selection),
            other => other,
        }
    }

    /// Validate the selection and, if it holds, build the order to submit.
    #[must_use]
    pub fn validate(self, ctx: &PlacementContext<'_>) -> Self {
        let Self::Validating(selection) = self else {
            return self;
        };
        let order = validate(&selection, ctx.addresses, ctx.vouchers, ctx.cart).and_then(
            |validated| {
                let quote = quote_cart(
                    ctx.cart,
                    validated.voucher.as_ref(),
                    validated.shipping_method,
                    ctx.policy,
                    ctx.now,
                )?;
                Ok(build_order(&validated, ctx.cart, &quote))
            },
        );
        match order {
            Ok(order) => Self::Submitting(order),
            Err(err) => Self::Rejected(err),
        }
    }

    /// The backend accepted the order.
    #[must_use]
    pub fn accepted(self, response: PaymentResponse) -> Self {
        let Self::Submitting(order) = self else {
            return self;
        };
        match order.payment_method {
            PaymentMethod::Cod => Self::Redirect(PlacementRedirect::CodResult {
                order_id: response.order_id,
            }),
            PaymentMethod::Online => match response.payment_url.filter(|u| !u.trim().is_empty()) {
                Some(url) => Self::Redirect(PlacementRedirect::Gateway(url)),
                None => Self::Failed(
                    "The payment gateway did not return a payment link".to_string(),
                ),
            },
        }
    }

    /// The backend call failed.
    #[must_use]
    pub fn failed(self, message: impl Into<String>) -> Self {
        match self {
            Self::Submitting(_) => Self::Failed(message.into()),
            other => other,
        }
    }

    /// The order payload, while submitting.
    #[must_use]
    pub const fn order(&self) -> Option<&OrderRequest> {
        match self {
            Self::Submitting(order) => Some(order),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::types::{CartItemId, ProductId};

    fn address() -> Address {
        Address {
            id: AddressId::new(5),
            recipient_name: "Lan".to_string(),
            phone: "0912345678".to_string(),
            street: "1 Trang Tien".to_string(),
            ward: None,
            district: "Hoan Kiem".to_string(),
            city: "Ha Noi".to_string(),
            is_default: true,
        }
    }

    fn cart() -> Vec<CartItem> {
        vec![
            CartItem {
                id: CartItemId::new(1),
                product_id: ProductId::new(10),
                variant_id: VariantId::new(100),
                product_name: "Cat tree".to_string(),
                variant_label: None,
                image: None,
                quantity: 2,
                unit_price: Decimal::from(100_000),
            },
            CartItem {
                id: CartItemId::new(2),
                product_id: ProductId::new(11),
                variant_id: VariantId::new(110),
                product_name: "Catnip".to_string(),
                variant_label: None,
                image: None,
                quantity: 1,
                unit_price: Decimal::from(50_000),
            },
        ]
    }

    fn voucher() -> Voucher {
        Voucher {
            id: VoucherId::new(3),
            code: "MEO10".to_string(),
            description: None,
            discount_amount: None,
            discount_percent: Some(Decimal::from(10)),
            valid_from: None,
            valid_to: None,
            used: false,
        }
    }

    fn selection(payment: PaymentMethod) -> CheckoutSelection {
        CheckoutSelection {
            address_id: Some(AddressId::new(5)),
            payment_method: Some(payment),
            shipping_method: ShippingMethod::Standard,
            voucher_id: Some(VoucherId::new(3)),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_missing_choices_fail_closed() {
        let addresses = [address()];
        let mut sel = selection(PaymentMethod::Cod);
        sel.address_id = None;
        assert_eq!(
            validate(&sel, &addresses, &[], &cart()),
            Err(CheckoutError::MissingAddress)
        );

        let mut sel = selection(PaymentMethod::Cod);
        sel.payment_method = None;
        assert_eq!(
            validate(&sel, &addresses, &[], &cart()),
            Err(CheckoutError::MissingPaymentMethod)
        );
    }

    #[test]
    fn test_unknown_references() {
        let mut sel = selection(PaymentMethod::Cod);
        assert_eq!(
            validate(&sel, &[], &[voucher()], &cart()),
            Err(CheckoutError::UnknownAddress(AddressId::new(5)))
        );
        assert_eq!(
            validate(&sel, &[address()], &[], &cart()),
            Err(CheckoutError::UnknownVoucher(VoucherId::new(3)))
        );
        sel.voucher_id = None;
        assert_eq!(
            validate(&sel, &[address()], &[], &[]),
            Err(CheckoutError::EmptyCart)
        );
    }

    #[test]
    fn test_build_order_carries_quote() {
        let validated = validate(
            &selection(PaymentMethod::Cod),
            &[address()],
            &[voucher()],
            &cart(),
        )
        .unwrap();
        let quote = quote_cart(
            &cart(),
            validated.voucher.as_ref(),
            validated.shipping_method,
            &PricingPolicy::default(),
            now(),
        )
        .unwrap();
        let order = build_order(&validated, &cart(), &quote);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.discount, Decimal::from(25_000));
        assert_eq!(order.total, Decimal::from(225_000));
        assert_eq!(order.voucher_id, Some(VoucherId::new(3)));

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["paymentMethod"], "COD");
        assert_eq!(json["total"], 225_000.0);
        assert_eq!(json["items"][0]["variantId"], 100);
    }

    #[test]
    fn test_oversized_voucher_keeps_payload_consistent() {
        let mut fixed = voucher();
        fixed.discount_amount = Some(Decimal::from(30_000));
        let mut small_cart = cart();
        small_cart.truncate(1);
        small_cart[0].quantity = 1;
        small_cart[0].unit_price = Decimal::from(10_000);

        let validated = validate(
            &selection(PaymentMethod::Cod),
            &[address()],
            &[fixed.clone()],
            &small_cart,
        )
        .unwrap();
        let quote = quote_cart(
            &small_cart,
            Some(&fixed),
            ShippingMethod::Standard,
            &PricingPolicy::default(),
            now(),
        )
        .unwrap();
        let order = build_order(&validated, &small_cart, &quote);

        assert_eq!(order.total, Decimal::ZERO);
        assert_eq!(order.discount, Decimal::from(10_000));
        assert_eq!(
            order.total,
            order.subtotal + order.shipping_fee + order.tax - order.discount
        );
    }

    #[test]
    fn test_unpriceable_cart_is_rejected() {
        let addresses = [address()];
        let mut cart = cart();
        cart[0].unit_price = Decimal::MAX;
        let policy = PricingPolicy::default();
        let ctx = PlacementContext {
            addresses: &addresses,
            vouchers: &[],
            cart: &cart,
            policy: &policy,
            now: now(),
        };
        let mut sel = selection(PaymentMethod::Cod);
        sel.voucher_id = None;

        let state = PlacementState::Idle.start(sel).validate(&ctx);
        assert_eq!(
            state,
            PlacementState::Rejected(CheckoutError::Pricing(PricingError::Overflow))
        );
    }

    #[test]
    fn test_cod_flow_redirects_to_result() {
        let addresses = [address()];
        let vouchers = [voucher()];
        let cart = cart();
        let policy = PricingPolicy::default();
        let ctx = PlacementContext {
            addresses: &addresses,
            vouchers: &vouchers,
            cart: &cart,
            policy: &policy,
            now: now(),
        };

        let state = PlacementState::Idle
            .start(selection(PaymentMethod::Cod))
            .validate(&ctx);
        assert!(state.order().is_some());

        let state = state.accepted(PaymentResponse {
            order_id: Some(OrderId::new(77)),
            payment_url: None,
        });
        assert_eq!(
            state,
            PlacementState::Redirect(PlacementRedirect::CodResult {
                order_id: Some(OrderId::new(77))
            })
        );
    }

    #[test]
    fn test_online_flow_requires_gateway_url() {
        let addresses = [address()];
        let cart = cart();
        let policy = PricingPolicy::default();
        let ctx = PlacementContext {
            addresses: &addresses,
            vouchers: &[],
            cart: &cart,
            policy: &policy,
            now: now(),
        };
        let mut sel = selection(PaymentMethod::Online);
        sel.voucher_id = None;

        let submitting = PlacementState::Idle.start(sel).validate(&ctx);
        let redirected = submitting.clone().accepted(PaymentResponse {
            order_id: None,
            payment_url: Some("https://pay.example/vnpay?tx=1".to_string()),
        });
        assert_eq!(
            redirected,
            PlacementState::Redirect(PlacementRedirect::Gateway(
                "https://pay.example/vnpay?tx=1".to_string()
            ))
        );

        let failed = submitting.accepted(PaymentResponse::default());
        assert!(matches!(failed, PlacementState::Failed(_)));
    }

    #[test]
    fn test_rejected_selection_stays_on_page() {
        let policy = PricingPolicy::default();
        let ctx = PlacementContext {
            addresses: &[],
            vouchers: &[],
            cart: &[],
            policy: &policy,
            now: now(),
        };
        let state = PlacementState::Idle
            .start(CheckoutSelection::default())
            .validate(&ctx);
        assert_eq!(state, PlacementState::Rejected(CheckoutError::MissingAddress));

        // Only a submitting state can fail or be accepted.
        assert_eq!(state.clone().failed("boom"), state);
        assert_eq!(
            PlacementState::Idle.accepted(PaymentResponse::default()),
            PlacementState::Idle
        );
    }
}
