//! Navigation menu visibility.
//!
//! Hidden labels are persisted in a long-lived cookie on the device, as
//! dot-separated slugs (`hidden_menu=wishlist.print-catalog`).

use std::fmt;
use std::str::FromStr;

use tower_sessions::cookie::{Cookie, SameSite, time::Duration};

/// Name of the cookie holding hidden menu labels.
pub const HIDDEN_MENU_COOKIE: &str = "hidden_menu";

/// The cookie outlives sessions.
const HIDDEN_MENU_MAX_AGE_DAYS: i64 = 365;

/// A static navigation label that can be hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MenuLabel {
    Catalog,
    Categories,
    Wishlist,
    Bag,
    Profile,
    PrintCatalog,
}

impl MenuLabel {
    /// Every label, in navigation order.
    pub const ALL: [Self; 6] = [
        Self::Catalog,
        Self::Categories,
        Self::Wishlist,
        Self::Bag,
        Self::Profile,
        Self::PrintCatalog,
    ];

    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::Categories => "categories",
            Self::Wishlist => "wishlist",
            Self::Bag => "bag",
            Self::Profile => "profile",
            Self::PrintCatalog => "print-catalog",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Catalog => "Catalog",
            Self::Categories => "Categories",
            Self::Wishlist => "Wishlist",
            Self::Bag => "Bag",
            Self::Profile => "Profile",
            Self::PrintCatalog => "Print catalog",
        }
    }
}

impl fmt::Display for MenuLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Error for an unknown menu slug.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown menu label: {0}")]
pub struct UnknownMenuLabel(pub String);

impl FromStr for MenuLabel {
    type Err = UnknownMenuLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|label| label.slug().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownMenuLabel(s.to_string()))
    }
}

/// Set of hidden navigation labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuVisibility {
    hidden: Vec<MenuLabel>,
}

impl MenuVisibility {
    /// Parse a cookie value. Unknown and repeated slugs are ignored.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let mut visibility = Self::default();
        for label in value.split('.').filter_map(|slug| slug.parse().ok()) {
            visibility.hide(label);
        }
        visibility
    }

    /// Read the visibility from a request's `Cookie` header values.
    #[must_use]
    pub fn from_cookie_header<'a>(headers: impl IntoIterator<Item = &'a str>) -> Self {
        headers
            .into_iter()
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == HIDDEN_MENU_COOKIE)
            .map(|cookie| Self::parse(cookie.value()))
            .unwrap_or_default()
    }

    /// Cookie value: hidden slugs in navigation order.
    #[must_use]
    pub fn to_cookie_value(&self) -> String {
        MenuLabel::ALL
            .into_iter()
            .filter(|label| self.is_hidden(*label))
            .map(MenuLabel::slug)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// The `Set-Cookie` persisting this visibility on the device.
    #[must_use]
    pub fn to_cookie(&self, secure: bool) -> Cookie<'static> {
        Cookie::build((HIDDEN_MENU_COOKIE, self.to_cookie_value()))
            .path("/")
            .max_age(Duration::days(HIDDEN_MENU_MAX_AGE_DAYS))
            .same_site(SameSite::Lax)
            .http_only(true)
            .secure(secure)
            .build()
    }

    #[must_use]
    pub fn is_hidden(&self, label: MenuLabel) -> bool {
        self.hidden.contains(&label)
    }

    #[must_use]
    pub fn is_visible(&self, label: MenuLabel) -> bool {
        !self.is_hidden(label)
    }

    pub fn hide(&mut self, label: MenuLabel) {
        if !self.is_hidden(label) {
            self.hidden.push(label);
        }
    }

    /// Flip a label. Returns `true` when the label is now hidden.
    pub fn toggle(&mut self, label: MenuLabel) -> bool {
        if self.is_hidden(label) {
            self.hidden.retain(|l| *l != label);
            false
        } else {
            self.hidden.push(label);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ignores_unknown_and_duplicates() {
        let visibility = MenuVisibility::parse("wishlist.bogus.WISHLIST..print-catalog");
        assert!(visibility.is_hidden(MenuLabel::Wishlist));
        assert!(visibility.is_hidden(MenuLabel::PrintCatalog));
        assert!(visibility.is_visible(MenuLabel::Bag));
        assert_eq!(visibility.to_cookie_value(), "wishlist.print-catalog");
    }

    #[test]
    fn test_hidden_flag_survives_cookie_round_trip() {
        let mut visibility = MenuVisibility::default();
        assert!(visibility.toggle(MenuLabel::Profile));
        assert!(visibility.toggle(MenuLabel::Catalog));

        let cookie = visibility.to_cookie(false);
        let header = format!("session=abc; {}={}", cookie.name(), cookie.value());
        let restored = MenuVisibility::from_cookie_header([header.as_str()]);
        assert_eq!(restored, MenuVisibility::parse("catalog.profile"));
        assert!(restored.is_hidden(MenuLabel::Profile));
    }

    #[test]
    fn test_toggle_back_shows_label() {
        let mut visibility = MenuVisibility::parse("bag");
        assert!(!visibility.toggle(MenuLabel::Bag));
        assert_eq!(visibility.to_cookie_value(), "");
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = MenuVisibility::parse("bag").to_cookie(true);
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::days(365)));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
    }

    #[test]
    fn test_missing_cookie_hides_nothing() {
        let visibility = MenuVisibility::from_cookie_header(["other=1"]);
        assert_eq!(visibility, MenuVisibility::default());
    }
}
