//! Admin panel route handlers.
//!
//! Every handler takes [`RequireAdmin`](crate::middleware::RequireAdmin);
//! product writes are sent to the backend with the admin's own access token
//! so the backend's row-level security has the final say.

pub mod menu;
pub mod products;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::state::AppState;

/// Largest accepted product form, image included.
pub const MAX_PRODUCT_FORM_BYTES: usize = 10 * 1024 * 1024;

/// Create the admin routes router.
pub fn routes() -> Router<AppState> {
    let product_routes = Router::new()
        .route("/", post(products::create))
        .route("/new", get(products::new_form))
        .route("/{id}", post(products::update))
        .route("/{id}/edit", get(products::edit_form))
        .route("/{id}/sold", post(products::toggle_sold))
        .route("/{id}/delete", post(products::delete))
        .layer(DefaultBodyLimit::max(MAX_PRODUCT_FORM_BYTES));

    Router::new()
        .route("/", get(products::index))
        .nest("/products", product_routes)
        .route("/menu", get(menu::index))
        .route("/menu/toggle", post(menu::toggle))
}
