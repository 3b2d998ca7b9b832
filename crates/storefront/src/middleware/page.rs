//! Per-request page context shared by every full-page template.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::middleware::{CspNonce, HiddenMenu, OptionalUser};
use crate::middleware::session::load_or_default;
use crate::models::{Bag, CurrentUser, MenuLabel, MenuVisibility, Wishlist, session_keys};
use crate::state::AppState;

/// One visible navigation link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    pub href: &'static str,
    pub title: &'static str,
    pub badge: Option<String>,
}

/// Navigation and layout data for the base template.
#[derive(Debug, Clone)]
pub struct Page {
    pub store_name: String,
    pub user: Option<CurrentUser>,
    pub bag_count: u32,
    pub wishlist_count: usize,
    pub menu: MenuVisibility,
    pub nonce: String,
}

impl Page {
    /// Navigation links that are not hidden, in menu order.
    #[must_use]
    pub fn nav_items(&self) -> Vec<NavItem> {
        MenuLabel::ALL
            .into_iter()
            .filter(|label| self.menu.is_visible(*label))
            .map(|label| {
                let (href, badge) = match label {
                    MenuLabel::Catalog => ("/", None),
                    MenuLabel::Categories => ("/categories", None),
                    MenuLabel::Wishlist => (
                        "/wishlist",
                        (self.wishlist_count > 0).then(|| self.wishlist_count.to_string()),
                    ),
                    MenuLabel::Bag => ("/bag", (self.bag_count > 0).then(|| self.bag_count.to_string())),
                    MenuLabel::Profile => ("/account", None),
                    MenuLabel::PrintCatalog => ("/catalog/print", None),
                };
                NavItem {
                    href,
                    title: label.title(),
                    badge,
                }
            })
            .collect()
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    /// The Admin link is shown to admins regardless of menu visibility.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(CurrentUser::is_admin)
    }

    #[must_use]
    pub fn greeting(&self) -> String {
        self.user
            .as_ref()
            .map(CurrentUser::greeting_name)
            .unwrap_or_default()
    }
}

impl FromRequestParts<AppState> for Page {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let OptionalUser(user) = OptionalUser::from_request_parts(parts, state).await?;
        let HiddenMenu(menu) = HiddenMenu::from_request_parts(parts, state).await?;
        let CspNonce(nonce) = CspNonce::from_request_parts(parts, state).await?;

        let (bag_count, wishlist_count) = match parts.extensions.get::<Session>() {
            Some(session) => {
                let bag: Bag = load_or_default(session, session_keys::BAG).await;
                let wishlist: Wishlist = load_or_default(session, session_keys::WISHLIST).await;
                (bag.item_count(), wishlist.len())
            }
            None => (0, 0),
        };

        Ok(Self {
            store_name: state.config().store.name.clone(),
            user,
            bag_count,
            wishlist_count,
            menu,
            nonce,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(hidden: &str) -> Page {
        Page {
            store_name: "Test Boutique".to_string(),
            user: None,
            bag_count: 3,
            wishlist_count: 0,
            menu: MenuVisibility::parse(hidden),
            nonce: String::new(),
        }
    }

    #[test]
    fn test_hidden_labels_are_left_out() {
        let titles: Vec<&str> = page("wishlist.print-catalog")
            .nav_items()
            .iter()
            .map(|item| item.title)
            .collect();
        assert_eq!(titles, vec!["Catalog", "Categories", "Bag", "Profile"]);
    }

    #[test]
    fn test_bag_badge_shows_item_count() {
        let items = page("").nav_items();
        let bag = items.iter().find(|item| item.href == "/bag");
        assert_eq!(bag.and_then(|item| item.badge.as_deref()), Some("3"));
        let wishlist = items.iter().find(|item| item.href == "/wishlist");
        assert_eq!(wishlist.and_then(|item| item.badge.clone()), None);
    }
}
