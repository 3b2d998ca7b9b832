//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Catalog (?category=&subcategory=)
//! GET  /health                 - Liveness
//! GET  /health/ready           - Backend readiness
//!
//! # Catalog
//! GET  /products/{id}          - Product detail
//! GET  /categories             - Category gallery + print selection
//! GET  /catalog/print          - Printable catalog (?category=..&category=..)
//!
//! # Bag
//! GET  /bag                    - Bag page
//! POST /bag/add                - Add a product
//! POST /bag/update             - Set a line's quantity
//! POST /bag/remove             - Remove a line
//! POST /bag/checkout           - Checkout placeholder
//!
//! # Wishlist
//! GET  /wishlist               - Wishlist page
//! POST /wishlist/toggle        - Save / unsave a product
//! POST /wishlist/move-to-bag   - Move a saved product into the bag
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action (rate limited)
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action (rate limited)
//! GET  /auth/oauth/{provider}  - Start federated login
//! GET  /auth/callback          - Finish federated login
//! POST /auth/logout            - Logout action
//!
//! # Account (requires login)
//! GET  /account                - Profile
//!
//! # Admin (requires admin role)
//! GET  /admin                        - Product table
//! GET  /admin/products/new           - New product form
//! POST /admin/products               - Create product
//! GET  /admin/products/{id}/edit     - Edit form
//! POST /admin/products/{id}          - Update product
//! POST /admin/products/{id}/sold     - Toggle sold flag
//! POST /admin/products/{id}/delete   - Delete product
//! GET  /admin/menu                   - Menu visibility
//! POST /admin/menu/toggle            - Hide / show a menu label
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod bag;
pub mod catalog;
pub mod health;
pub mod home;
pub mod products;
pub mod wishlist;

use axum::{
    Router,
    http::Uri,
    routing::{get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(auth_rate_limiter())),
        )
        .route(
            "/register",
            get(auth::register_page).merge(post(auth::register).layer(auth_rate_limiter())),
        )
        .route("/oauth/{provider}", get(auth::oauth_start))
        .route("/callback", get(auth::oauth_callback))
        .route("/logout", post(auth::logout))
}

/// Create the bag routes router.
pub fn bag_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(bag::show))
        .route("/add", post(bag::add))
        .route("/update", post(bag::update))
        .route("/remove", post(bag::remove))
        .route("/checkout", post(bag::checkout))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/toggle", post(wishlist::toggle))
        .route("/move-to-bag", post(wishlist::move_to_bag))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/products/{id}", get(products::show))
        .route("/categories", get(catalog::categories))
        .route("/catalog/print", get(catalog::print))
        .nest("/bag", bag_routes())
        .nest("/wishlist", wishlist_routes())
        .route("/account", get(account::index))
        .nest("/auth", auth_routes())
        .nest("/admin", admin::routes())
}

/// Human-readable text for a `?notice=` code.
///
/// Unknown codes render nothing so arbitrary query text is never echoed.
#[must_use]
pub fn notice_message(code: Option<&str>) -> Option<&'static str> {
    Some(match code? {
        "added_to_bag" => "Added to your bag.",
        "bag_updated" => "Your bag has been updated.",
        "moved_to_bag" => "Moved from your wishlist to your bag.",
        "saved" => "Saved to your wishlist.",
        "unsaved" => "Removed from your wishlist.",
        "logged_out" => "You have been signed out.",
        "product_created" => "Product created.",
        "product_updated" => "Product updated.",
        "product_deleted" => "Product deleted.",
        "sold_toggled" => "Sold status updated.",
        "menu_updated" => "Menu visibility updated.",
        _ => return None,
    })
}

/// A redirect target from a form field, if it stays on this site.
///
/// Only visible ASCII is accepted: browsers drop tabs and newlines from
/// URLs, so `/\t/host` would otherwise become `//host`.
#[must_use]
pub fn local_redirect(target: Option<&str>) -> Option<&str> {
    target.filter(|t| {
        t.starts_with('/')
            && !t.starts_with("//")
            && t.bytes().all(|b| b.is_ascii_graphic() && b != b'\\')
            && t.parse::<Uri>()
                .is_ok_and(|uri| uri.scheme().is_none() && uri.authority().is_none())
    })
}
