//! PawPal Core - shared types and storefront logic.
//!
//! This crate is used by every PawPal component:
//! - `storefront` - customer-facing pet store
//! - `admin` - marketing and operations back-office
//! - `cli` - session-store migrations and offline checkout quotes
//!
//! # Architecture
//!
//! The core crate holds only types and pure functions - no I/O, no database
//! access, no HTTP clients. Handlers fetch from the REST API, then hand the
//! data to these functions to filter, paginate and price it.
//!
//! # Modules
//!
//! - [`types`] - REST DTOs plus newtypes for IDs, prices, emails and statuses
//! - [`pricing`] - checkout subtotal, voucher discount, shipping, tax and total
//! - [`checkout`] - order placement validation and state machine
//! - [`listing`] - product, review and ticket filters and sort orders
//! - [`pagination`] - page slicing
//! - [`wishlist`] - wishlist membership

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod listing;
pub mod pagination;
pub mod pricing;
pub mod types;
pub mod wishlist;

pub use checkout::{
    CheckoutError, CheckoutSelection, OrderLine, OrderRequest, PaymentResponse, PlacementContext,
    PlacementRedirect, PlacementState, ValidatedSelection,
};
pub use listing::{ProductFilter, ProductSort, ReviewFilter, TicketFilter};
pub use pagination::{PageRequest, Paginated, paginate};
pub use pricing::{CheckoutQuote, LineAmount, PricingError, PricingPolicy, quote, quote_cart};
pub use types::*;
pub use wishlist::{Wishlist, WishlistAction};
