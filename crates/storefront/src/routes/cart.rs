//! Cart route handlers.
//!
//! The cart lives on the REST backend, keyed by the customer's token, so
//! every cart page requires a login.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use pawpal_core::{
    CartItem, CartItemId, PricingError, ProductId, VariantId, format_vnd, pricing,
};
use serde::Deserialize;
use tracing::instrument;

use super::Layout;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Largest quantity accepted for a single line.
const MAX_LINE_QUANTITY: u32 = 99;

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub name: String,
    pub variant_label: Option<String>,
    pub image: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

impl TryFrom<&CartItem> for CartItemView {
    type Error = PricingError;

    fn try_from(item: &CartItem) -> std::result::Result<Self, PricingError> {
        Ok(Self {
            id: item.id,
            product_id: item.product_id,
            name: item.product_name.clone(),
            variant_label: item.variant_label.clone(),
            image: item.image.clone(),
            quantity: item.quantity,
            unit_price: format_vnd(item.unit_price),
            line_total: format_vnd(item.line_total()?),
        })
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u64,
}

impl TryFrom<&[CartItem]> for CartView {
    type Error = PricingError;

    fn try_from(items: &[CartItem]) -> std::result::Result<Self, PricingError> {
        let lines: Vec<_> = items.iter().map(pricing::LineAmount::from).collect();
        Ok(Self {
            items: items
                .iter()
                .map(CartItemView::try_from)
                .collect::<std::result::Result<_, _>>()?,
            subtotal: format_vnd(pricing::subtotal(&lines)?),
            item_count: items.iter().map(|i| u64::from(i.quantity)).sum(),
        })
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub variant_id: VariantId,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub item_id: CartItemId,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub item_id: CartItemId,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub cart: CartView,
}

fn check_quantity(quantity: u32) -> Result<u32> {
    if quantity == 0 || quantity > MAX_LINE_QUANTITY {
        return Err(AppError::BadRequest(format!(
            "quantity must be between 1 and {MAX_LINE_QUANTITY}"
        )));
    }
    Ok(quantity)
}

/// Display cart page.
#[instrument(skip(state, customer))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<CartShowTemplate> {
    let items = state.api().cart(&customer.access_token).await?;

    Ok(CartShowTemplate {
        layout: Layout::new(Some(&customer)),
        cart: CartView::try_from(items.as_slice())?,
    })
}

/// Add a variant to the cart.
#[instrument(skip(state, customer))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let quantity = check_quantity(form.quantity.unwrap_or(1))?;
    state
        .api()
        .add_to_cart(&customer.access_token, form.variant_id, quantity)
        .await?;

    let variant_id = form.variant_id.to_string();
    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("variant_id", variant_id.as_str())]),
    );
    Ok(Redirect::to("/cart").into_response())
}

/// Change a cart line's quantity. Zero removes the line.
#[instrument(skip(state, customer))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let api = state.api();
    if form.quantity == 0 {
        api.remove_cart_item(&customer.access_token, form.item_id)
            .await?;
    } else {
        let quantity = check_quantity(form.quantity)?;
        api.update_cart_item(&customer.access_token, form.item_id, quantity)
            .await?;
    }
    Ok(Redirect::to("/cart").into_response())
}

/// Remove a cart line.
#[instrument(skip(state, customer))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    state
        .api()
        .remove_cart_item(&customer.access_token, form.item_id)
        .await?;
    Ok(Redirect::to("/cart").into_response())
}
