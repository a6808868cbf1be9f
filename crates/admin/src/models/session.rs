//! Session-related types for admin authentication.
//!
//! Types stored in the session for authentication state.

use std::fmt;

use serde::{Deserialize, Serialize};

use pawpal_core::{Email, LoginResult, UserId, UserRole};

/// Session-stored staff identity.
///
/// Minimal data stored in the session to identify the logged-in staff
/// member, plus the bearer token every back-office REST call is made with.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentStaff {
    /// Backend user ID.
    pub id: UserId,
    /// Staff member's email address.
    pub email: Email,
    /// Staff member's display name.
    pub name: String,
    /// Marketing or admin.
    pub role: UserRole,
    /// REST API bearer token.
    pub access_token: String,
}

impl CurrentStaff {
    /// Build the session identity from a login, if the account is staff.
    #[must_use]
    pub fn from_login(login: LoginResult) -> Option<Self> {
        if !login.user.role.is_staff() {
            return None;
        }
        Some(Self {
            id: login.user.id,
            name: login.user.display_name().to_string(),
            email: login.user.email,
            role: login.user.role,
            access_token: login.access_token,
        })
    }

    /// Whether this staff member has full back-office access.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl fmt::Debug for CurrentStaff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentStaff")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("role", &self.role)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in staff member.
    pub const CURRENT_STAFF: &str = "current_staff";
}
