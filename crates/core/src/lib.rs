//! Hearth Core - shared backend types and display rules.
//!
//! This crate provides the types used by both Hearth Home binaries:
//! - `storefront` - Public shop (catalog, cart, checkout, account)
//! - `admin` - Back-office screens (products, categories, orders, users)
//!
//! # Architecture
//!
//! By default the core crate contains only types and pure functions - no I/O.
//! Every DTO mirrors a JSON document returned by the Hearth REST backend; the
//! backend stays authoritative for prices, stock and statuses.
//!
//! # Features
//!
//! - `client` - `api::ApiClient`, the shared `reqwest` client for the backend
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, money, statuses and email addresses
//! - [`catalog`] - Products, the category tree and its flattening
//! - [`cart`] - Cart lines and display totals
//! - [`order`] - Orders, status history and display totals
//! - [`account`] - Users, addresses and bulk status changes
//! - [`envelope`] - The response wrappers used by the backend
//! - [`search`] - AI search replies and product suggestions
//! - [`secret`] - Session secret strength rules
//! - `api` - Backend HTTP client (feature `client`)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod account;
#[cfg(feature = "client")]
pub mod api;
pub mod cart;
pub mod catalog;
pub mod envelope;
pub mod order;
pub mod search;
pub mod secret;
pub mod types;

mod lenient;

pub use envelope::{Envelope, EnvelopeError};
pub use types::*;
