//! Domain models for storefront.
//!
//! Catalog, cart and account DTOs live in `pawpal_core`; this module only
//! holds what the storefront keeps in its own session.

pub mod session;

pub use session::{CurrentCustomer, keys as session_keys};
