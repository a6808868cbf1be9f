//! Account route handlers: the address book.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use pawpal_core::{Address, AddressId, AddressInput};
use tracing::instrument;

use super::Layout;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Saved address display data for templates.
#[derive(Clone)]
pub struct AddressView {
    pub id: AddressId,
    pub recipient_name: String,
    pub phone: String,
    pub line: String,
    pub is_default: bool,
}

impl From<&Address> for AddressView {
    fn from(address: &Address) -> Self {
        Self {
            id: address.id,
            recipient_name: address.recipient_name.clone(),
            phone: address.phone.clone(),
            line: address.one_line(),
            is_default: address.is_default,
        }
    }
}

/// Address book template.
#[derive(Template, WebTemplate)]
#[template(path = "account/addresses.html")]
pub struct AddressesTemplate {
    pub layout: Layout,
    pub addresses: Vec<AddressView>,
    /// Values to refill the new-address form with.
    pub form: AddressInput,
    pub errors: Vec<String>,
}

/// Display the address book.
#[instrument(skip(state, customer))]
pub async fn addresses(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<AddressesTemplate> {
    let addresses = state.api().addresses(&customer.access_token).await?;

    Ok(AddressesTemplate {
        layout: Layout::new(Some(&customer)),
        addresses: addresses.iter().map(AddressView::from).collect(),
        form: AddressInput::default(),
        errors: Vec::new(),
    })
}

/// Save a new address.
///
/// Invalid input re-renders the page with every validation message.
#[instrument(skip(state, customer, input))]
pub async fn create_address(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Form(input): Form<AddressInput>,
) -> Result<Response> {
    let api = state.api();
    match input.validate() {
        Ok(valid) => {
            let address = api.create_address(&customer.access_token, &valid).await?;
            tracing::info!(address_id = %address.id, "Address saved");
            Ok(Redirect::to("/account/addresses").into_response())
        }
        Err(errors) => {
            let addresses = api.addresses(&customer.access_token).await?;
            let page = AddressesTemplate {
                layout: Layout::new(Some(&customer)),
                addresses: addresses.iter().map(AddressView::from).collect(),
                form: input,
                errors: errors.iter().map(ToString::to_string).collect(),
            };
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
    }
}

/// Delete a saved address.
#[instrument(skip(state, customer))]
pub async fn delete_address(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Response> {
    state
        .api()
        .delete_address(&customer.access_token, id)
        .await?;
    Ok(Redirect::to("/account/addresses").into_response())
}
