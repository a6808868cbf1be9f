//! HTTP middleware stack for admin.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with `PostgreSQL` store)
//! 4. Role extractors (`RequireStaff`, `RequireAdmin`) in handlers

pub mod auth;
pub mod session;

pub use auth::{
    OptionalStaff, RequireAdmin, RequireStaff, clear_current_staff, set_current_staff,
};
pub use session::{create_session_layer, session_layer, session_store};
