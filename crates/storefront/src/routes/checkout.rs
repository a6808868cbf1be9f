//! Checkout route handlers.
//!
//! `GET /checkout` renders the quote for the current selection; the page's
//! "update total" button re-submits the same form as a GET so the voucher and
//! shipping method are re-priced server-side. `POST /checkout` drives the
//! order through [`PlacementState`].

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use pawpal_core::{
    Address, AddressId, CartItem, CheckoutQuote, CheckoutSelection, OrderId, PaymentMethod,
    PlacementContext, PlacementRedirect, PlacementState, PricingPolicy, ShippingMethod, Voucher,
    VoucherId, format_vnd, quote_cart,
};
use serde::Deserialize;
use tracing::instrument;

use super::cart::CartView;
use super::{Layout, empty_string_as_none};
use crate::api::ApiError;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::CurrentCustomer;
use crate::state::AppState;

/// Checkout selection as submitted by the checkout form (GET or POST).
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub address_id: Option<AddressId>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub shipping_method: Option<ShippingMethod>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub voucher_id: Option<VoucherId>,
}

impl CheckoutForm {
    #[must_use]
    pub fn selection(&self) -> CheckoutSelection {
        CheckoutSelection {
            address_id: self.address_id,
            payment_method: self.payment_method,
            shipping_method: self.shipping_method.unwrap_or_default(),
            voucher_id: self.voucher_id,
        }
    }
}

/// Everything the checkout page needs from the backend.
pub struct CheckoutData {
    pub cart: Vec<CartItem>,
    pub addresses: Vec<Address>,
    pub vouchers: Vec<Voucher>,
}

/// Address radio option for templates.
#[derive(Clone)]
pub struct AddressOption {
    pub id: AddressId,
    pub recipient_name: String,
    pub phone: String,
    pub line: String,
    pub selected: bool,
}

/// Voucher option for templates.
#[derive(Clone)]
pub struct VoucherOption {
    pub id: VoucherId,
    pub code: String,
    pub benefit: String,
    pub description: Option<String>,
    pub usable: bool,
    pub selected: bool,
}

/// Shipping or payment method option for templates.
#[derive(Clone)]
pub struct MethodOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Price breakdown for templates.
#[derive(Clone)]
pub struct QuoteView {
    pub subtotal: String,
    pub discount: Option<String>,
    pub shipping_fee: String,
    pub tax: String,
    pub amount_due: String,
}

impl From<&CheckoutQuote> for QuoteView {
    fn from(quote: &CheckoutQuote) -> Self {
        Self {
            subtotal: format_vnd(quote.subtotal),
            discount: (!quote.charged_discount().is_zero())
                .then(|| format_vnd(quote.charged_discount())),
            shipping_fee: format_vnd(quote.shipping_fee),
            tax: format_vnd(quote.tax),
            amount_due: format_vnd(quote.amount_due()),
        }
    }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub layout: Layout,
    pub cart: CartView,
    pub addresses: Vec<AddressOption>,
    pub vouchers: Vec<VoucherOption>,
    pub shipping_methods: Vec<MethodOption>,
    pub payment_methods: Vec<MethodOption>,
    pub quote: QuoteView,
    pub voucher_note: Option<String>,
    pub error: Option<String>,
}

/// Cash-on-delivery confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/result.html")]
pub struct CheckoutResultTemplate {
    pub layout: Layout,
    pub order_id: Option<OrderId>,
}

/// Result page query parameters.
#[derive(Debug, Deserialize)]
pub struct ResultQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub order_id: Option<OrderId>,
}

/// Build the checkout page for a selection.
///
/// # Errors
///
/// Returns `AppError::Pricing` if the cart cannot be priced.
pub fn checkout_page(
    customer: &CurrentCustomer,
    selection: &CheckoutSelection,
    data: &CheckoutData,
    policy: &PricingPolicy,
    now: DateTime<Utc>,
    error: Option<String>,
) -> Result<CheckoutTemplate> {
    let address_id = selection.address_id.or_else(|| {
        data.addresses
            .iter()
            .find(|a| a.is_default)
            .or_else(|| data.addresses.first())
            .map(|a| a.id)
    });

    let voucher = selection
        .voucher_id
        .and_then(|id| data.vouchers.iter().find(|v| v.id == id));
    let voucher_note = match (selection.voucher_id, voucher) {
        (Some(_), None) => Some("The selected voucher is not available.".to_string()),
        (_, Some(v)) if !v.is_valid_at(now) => Some(format!(
            "Voucher {} has expired or was already used, so no discount applies.",
            v.code
        )),
        _ => None,
    };

    let quote = quote_cart(&data.cart, voucher, selection.shipping_method, policy, now)?;

    Ok(CheckoutTemplate {
        layout: Layout::new(Some(customer)),
        cart: CartView::try_from(data.cart.as_slice())?,
        addresses: data
            .addresses
            .iter()
            .map(|a| AddressOption {
                id: a.id,
                recipient_name: a.recipient_name.clone(),
                phone: a.phone.clone(),
                line: a.one_line(),
                selected: Some(a.id) == address_id,
            })
            .collect(),
        vouchers: data
            .vouchers
            .iter()
            .map(|v| VoucherOption {
                id: v.id,
                code: v.code.clone(),
                benefit: v.benefit_label(),
                description: v.description.clone(),
                usable: v.is_valid_at(now),
                selected: Some(v.id) == selection.voucher_id,
            })
            .collect(),
        shipping_methods: ShippingMethod::ALL
            .into_iter()
            .map(|m| MethodOption {
                value: m.as_str(),
                label: m.label(),
                selected: m == selection.shipping_method,
            })
            .collect(),
        payment_methods: [PaymentMethod::Cod, PaymentMethod::Online]
            .into_iter()
            .map(|m| MethodOption {
                value: m.as_str(),
                label: m.label(),
                selected: Some(m) == selection.payment_method,
            })
            .collect(),
        quote: QuoteView::from(&quote),
        voucher_note,
        error,
    })
}

/// Fetch cart, addresses and vouchers concurrently.
///
/// Vouchers are optional: a voucher outage still lets the customer check out.
async fn load_checkout_data(state: &AppState, token: &str) -> Result<CheckoutData> {
    let api = state.api();
    let (cart, addresses, vouchers) =
        tokio::join!(api.cart(token), api.addresses(token), api.vouchers(token));

    let vouchers = vouchers.unwrap_or_else(|e| {
        tracing::warn!("Failed to fetch vouchers: {e}");
        Vec::new()
    });

    Ok(CheckoutData {
        cart: cart?,
        addresses: addresses?,
        vouchers,
    })
}

/// Display the checkout page with a live quote.
#[instrument(skip(state, customer))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Query(form): Query<CheckoutForm>,
) -> Result<Response> {
    let data = load_checkout_data(&state, &customer.access_token).await?;
    if data.cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    Ok(checkout_page(
        &customer,
        &form.selection(),
        &data,
        &state.config().pricing,
        Utc::now(),
        None,
    )?
    .into_response())
}

/// Place the order.
///
/// Validation failures re-render the page with an alert; a placed order
/// redirects to the payment gateway (online) or the result page (COD).
#[instrument(skip(state, customer, form))]
pub async fn place_order(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let data = load_checkout_data(&state, &customer.access_token).await?;
    let selection = form.selection();
    let policy = &state.config().pricing;
    let now = Utc::now();

    let ctx = PlacementContext {
        addresses: &data.addresses,
        vouchers: &data.vouchers,
        cart: &data.cart,
        policy,
        now,
    };
    let placement = PlacementState::default()
        .start(selection.clone())
        .validate(&ctx);

    let placement = match placement.order().cloned() {
        Some(order) => {
            match state
                .api()
                .create_payment(&customer.access_token, &order)
                .await
            {
                Ok(response) => placement.accepted(response),
                Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
                Err(ApiError::Rejected(message)) => placement.failed(message),
                Err(e) => {
                    tracing::error!("Failed to create payment: {e}");
                    placement.failed("We couldn't place your order. Please try again.")
                }
            }
        }
        None => placement,
    };

    let (status, error) = match placement {
        PlacementState::Redirect(PlacementRedirect::Gateway(url)) => {
            add_breadcrumb("checkout", "Redirected to payment gateway", None);
            tracing::info!(method = "ONLINE", "Order created, redirecting to gateway");
            return Ok(Redirect::to(&url).into_response());
        }
        PlacementState::Redirect(PlacementRedirect::CodResult { order_id }) => {
            add_breadcrumb("checkout", "Placed cash-on-delivery order", None);
            tracing::info!(?order_id, method = "COD", "Order placed");
            let target = order_id.map_or_else(
                || "/checkout/result".to_string(),
                |id| format!("/checkout/result?order_id={id}"),
            );
            return Ok(Redirect::to(&target).into_response());
        }
        PlacementState::Rejected(err) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
        PlacementState::Failed(message) => (StatusCode::BAD_GATEWAY, message),
        other => {
            return Err(AppError::Internal(format!(
                "order placement stopped in {other:?}"
            )));
        }
    };

    let page = checkout_page(&customer, &selection, &data, policy, now, Some(error))?;
    Ok((status, page).into_response())
}

/// Display the cash-on-delivery confirmation.
#[instrument(skip(customer))]
pub async fn result(
    OptionalAuth(customer): OptionalAuth,
    Query(query): Query<ResultQuery>,
) -> CheckoutResultTemplate {
    CheckoutResultTemplate {
        layout: Layout::new(customer.as_ref()),
        order_id: query.order_id,
    }
}
