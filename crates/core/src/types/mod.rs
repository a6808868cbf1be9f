//! Core types for PawPal.
//!
//! DTOs mirrored from the REST API plus type-safe wrappers for IDs, money,
//! emails and statuses.

pub mod account;
pub mod banner;
pub mod catalog;
pub mod email;
pub mod envelope;
pub mod id;
pub mod price;
pub mod status;
pub mod support;

pub use account::{AccountUser, Address, AddressError, AddressInput, CartItem, LoginResult, Voucher};
pub use banner::{BannerError, BannerInput};
pub use catalog::{
    AttributeValue, Banner, Category, CategoryRef, Product, ProductSummary, Variant, live_banners,
};
pub use email::{Email, EmailError};
pub use envelope::{ApiEnvelope, EnvelopeError};
pub use id::*;
pub use price::{CurrencyCode, Price, format_vnd};
pub use status::*;
pub use support::{
    MonthlyCount, ProductDashboard, Review, SupportTicket, TicketUpdate, TopProduct,
    UserDashboard, average_rating,
};
