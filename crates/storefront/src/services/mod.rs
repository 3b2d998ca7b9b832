//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Sign-in, registration and federated login against the backend

pub mod auth;
