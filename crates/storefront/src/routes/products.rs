//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use boutique_core::ProductId;
use tower_sessions::Session;
use tracing::instrument;

use crate::catalog::Product;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{Page, load_or_default};
use crate::models::{Bag, Wishlist, session_keys};
use crate::state::AppState;

/// How many products from the same category to suggest.
const RELATED_LIMIT: usize = 4;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub price: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub availability: Option<String>,
    pub image_url: Option<String>,
    pub sold: bool,
    /// On the visitor's wishlist.
    pub saved: bool,
}

impl ProductView {
    #[must_use]
    pub fn new(product: &Product, wishlist: &Wishlist) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            description: product.description.clone(),
            price: product.price.display(),
            category: product.category.clone(),
            subcategory: product.subcategory.clone(),
            availability: product.availability.clone(),
            image_url: product.image_url.clone(),
            sold: product.sold,
            saved: wishlist.contains(product.id),
        }
    }
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: Page,
    pub product: ProductView,
    pub in_bag: u32,
    pub related_products: Vec<ProductView>,
}

/// Display product detail page.
#[instrument(skip(state, session, page))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    page: Page,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let products = state.catalog().products().await;
    let product = products
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let wishlist: Wishlist = load_or_default(&session, session_keys::WISHLIST).await;
    let bag: Bag = load_or_default(&session, session_keys::BAG).await;
    let in_bag = bag
        .lines()
        .iter()
        .find(|line| line.product_id == id)
        .map_or(0, |line| line.quantity);

    let related_products = products
        .iter()
        .filter(|p| p.id != id && !p.sold && p.category == product.category)
        .take(RELATED_LIMIT)
        .map(|p| ProductView::new(p, &wishlist))
        .collect();

    Ok(ProductShowTemplate {
        page,
        product: ProductView::new(product, &wishlist),
        in_bag,
        related_products,
    })
}
