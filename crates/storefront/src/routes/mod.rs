//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                            - Home page (banners, popular categories, best sellers)
//!
//! # Products
//! GET  /products                    - Product listing (filter, sort, paginate)
//! GET  /products/{id}               - Product detail
//!
//! # Cart (requires auth)
//! GET  /cart                        - Cart page
//! POST /cart/add                    - Add a variant
//! POST /cart/update                 - Change a line's quantity
//! POST /cart/remove                 - Remove a line
//!
//! # Checkout (requires auth)
//! GET  /checkout                    - Checkout page with live quote
//! POST /checkout                    - Place the order
//! GET  /checkout/result             - Cash-on-delivery confirmation
//!
//! # Wishlist (requires auth)
//! GET  /wishlist                    - Saved products
//! POST /wishlist/toggle             - Add or remove a product
//!
//! # Account (requires auth)
//! GET  /account/addresses           - Address book
//! POST /account/addresses           - Save a new address
//! POST /account/addresses/{id}/delete - Delete an address
//!
//! # Auth
//! GET  /auth/login                  - Login page
//! POST /auth/login                  - Login action
//! POST /auth/logout                 - Logout action
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod products;
pub mod wishlist;

use std::fmt::Display;
use std::str::FromStr;

use axum::{
    Router,
    routing::{get, post},
};
use serde::{Deserialize, Deserializer};

use crate::models::CurrentCustomer;
use crate::state::AppState;

/// Data every page's header needs.
#[derive(Clone, Default)]
pub struct Layout {
    pub customer_name: Option<String>,
}

impl Layout {
    #[must_use]
    pub fn new(customer: Option<&CurrentCustomer>) -> Self {
        Self {
            customer_name: customer.map(|c| c.name.clone()),
        }
    }
}

/// Deserialize an optional query/form value, treating `""` as absent.
///
/// HTML forms submit empty selects and inputs as empty strings.
///
/// # Errors
///
/// Returns a deserialization error if a non-empty value fails to parse.
pub fn empty_string_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let opt = Option::<String>::deserialize(de)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::place_order))
        .route("/result", get(checkout::result))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::index))
        .route("/toggle", post(wishlist::toggle))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/addresses",
            get(account::addresses).post(account::create_address),
        )
        .route("/addresses/{id}/delete", post(account::delete_address))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/account", account_routes())
        .nest("/auth", auth_routes())
}
