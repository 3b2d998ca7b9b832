//! Storefront user roles.

use serde::{Deserialize, Serialize};

/// Role of a signed-in user, read from the user's profile record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Can edit products and menu visibility.
    Admin,
    /// Regular shopper.
    #[default]
    Customer,
}

impl Role {
    /// Resolve the role stored on a profile record.
    ///
    /// Anything other than `admin` (including a missing profile or column)
    /// is a customer.
    #[must_use]
    pub fn from_profile(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("admin") => Self::Admin,
            _ => Self::Customer,
        }
    }

    /// Whether this role may use the admin panel.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Customer => write!(f, "customer"),
        }
    }
}
