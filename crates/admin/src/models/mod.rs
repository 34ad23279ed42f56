//! Session-held models for the back-office.

pub mod session;

pub use session::{CurrentAdmin, Flash, FlashKind, keys as session_keys};
