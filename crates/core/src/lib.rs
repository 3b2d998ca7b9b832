//! Boutique Core - Shared types library.
//!
//! Types used by the storefront and by the integration tests:
//! product and user identifiers, prices, validated emails and roles.
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no
//! backend access. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails and roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
