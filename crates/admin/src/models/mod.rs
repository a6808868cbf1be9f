//! Domain models for admin.
//!
//! Back-office DTOs live in `pawpal_core`; this module only holds what the
//! admin keeps in its own session.

pub mod session;

pub use session::{CurrentStaff, keys as session_keys};
