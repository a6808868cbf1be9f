//! Session-related types.
//!
//! Types stored in the session for authentication state.

use std::fmt;

use serde::{Deserialize, Serialize};

use pawpal_core::{Email, LoginResult, UserId};

/// Session-stored customer identity.
///
/// Holds the bearer token issued by `POST /auth/login`; every customer call
/// to the REST API is made with it. `Debug` redacts the token.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentCustomer {
    /// Backend user ID.
    pub id: UserId,
    /// Customer's email address.
    pub email: Email,
    /// Name to greet the customer with.
    pub name: String,
    /// REST API bearer token.
    pub access_token: String,
}

impl From<LoginResult> for CurrentCustomer {
    fn from(login: LoginResult) -> Self {
        Self {
            id: login.user.id,
            name: login.user.display_name().to_string(),
            email: login.user.email,
            access_token: login.access_token,
        }
    }
}

impl fmt::Debug for CurrentCustomer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentCustomer")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in customer.
    pub const CURRENT_CUSTOMER: &str = "current_customer";
}
