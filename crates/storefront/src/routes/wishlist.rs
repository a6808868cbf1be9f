//! Wishlist route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use pawpal_core::{ProductId, Wishlist, WishlistAction};
use serde::Deserialize;
use tracing::instrument;

use super::Layout;
use super::products::ProductCardView;
use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::middleware::auth::safe_redirect_target;
use crate::state::AppState;

/// Toggle form data.
#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    pub product_id: ProductId,
    /// Page to return to; only same-site paths are honoured.
    #[serde(default)]
    pub redirect_to: Option<String>,
}

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "wishlist/index.html")]
pub struct WishlistTemplate {
    pub layout: Layout,
    pub products: Vec<ProductCardView>,
}

/// Display the wishlist.
#[instrument(skip(state, customer))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<WishlistTemplate> {
    let products = state.api().wishlist(&customer.access_token).await?;
    let wishlist: Wishlist = products.iter().map(|p| p.id).collect();

    Ok(WishlistTemplate {
        layout: Layout::new(Some(&customer)),
        products: products
            .iter()
            .map(|p| ProductCardView::new(p, &wishlist))
            .collect(),
    })
}

/// Add the product if absent, remove it if present.
///
/// Membership is read fresh from the backend so the toggle reflects what
/// the customer actually has saved, not what the page showed.
#[instrument(skip(state, customer, form), fields(product_id = %form.product_id))]
pub async fn toggle(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Form(form): Form<ToggleForm>,
) -> Result<Response> {
    let api = state.api();
    let token = &customer.access_token;

    let mut wishlist: Wishlist = api.wishlist(token).await?.iter().map(|p| p.id).collect();
    let action = wishlist.toggle(form.product_id);
    match action {
        WishlistAction::Added => api.add_to_wishlist(token, form.product_id).await?,
        WishlistAction::Removed => api.remove_from_wishlist(token, form.product_id).await?,
    }

    let product_id = form.product_id.to_string();
    let message = match action {
        WishlistAction::Added => "Added to wishlist",
        WishlistAction::Removed => "Removed from wishlist",
    };
    add_breadcrumb("wishlist", message, Some(&[("product_id", product_id.as_str())]));
    tracing::debug!(?action, "Wishlist toggled");

    let target = safe_redirect_target(form.redirect_to.as_deref());
    Ok(Redirect::to(target).into_response())
}
