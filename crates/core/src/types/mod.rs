//! Core types for the Boutique storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod role;

pub use email::{Email, EmailError};
pub use id::{IdParseError, ProductId, UserId};
pub use price::{CurrencyCode, Price, PriceError};
pub use role::Role;
