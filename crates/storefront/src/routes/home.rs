//! Catalog (home page) route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::catalog::{CatalogFilter, category_tree, same_label};
use crate::filters;
use crate::middleware::{Page, load_or_default};
use crate::models::{Wishlist, session_keys};
use crate::routes::notice_message;
use crate::routes::products::ProductView;
use crate::state::AppState;

/// Catalog query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub notice: Option<String>,
}

/// A category link in the sidebar.
#[derive(Clone)]
pub struct CategoryLink {
    pub name: String,
    pub product_count: usize,
    pub selected: bool,
    pub subcategories: Vec<SubcategoryLink>,
}

/// A subcategory link under its category.
#[derive(Clone)]
pub struct SubcategoryLink {
    pub name: String,
    pub selected: bool,
}

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/index.html")]
pub struct CatalogTemplate {
    pub page: Page,
    pub products: Vec<ProductView>,
    pub categories: Vec<CategoryLink>,
    pub heading: String,
    pub filtered: bool,
    pub notice: Option<&'static str>,
}

/// Display the catalog, optionally narrowed to a category/subcategory.
#[instrument(skip(state, session, page))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    page: Page,
    Query(query): Query<CatalogQuery>,
) -> impl IntoResponse {
    let products = state.catalog().products().await;
    let wishlist: Wishlist = load_or_default(&session, session_keys::WISHLIST).await;

    let filter = CatalogFilter {
        category: query.category,
        subcategory: query.subcategory,
    };
    let is_selected = |wanted: Option<&str>, name: &str| {
        wanted.is_some_and(|w| same_label(w, name))
    };

    let categories = category_tree(&products)
        .into_iter()
        .map(|node| {
            let selected = is_selected(filter.category(), &node.name);
            CategoryLink {
                subcategories: node
                    .subcategories
                    .iter()
                    .map(|sub| SubcategoryLink {
                        name: sub.clone(),
                        selected: selected && is_selected(filter.subcategory(), sub),
                    })
                    .collect(),
                name: node.name,
                product_count: node.product_count,
                selected,
            }
        })
        .collect();

    let heading = match (filter.category(), filter.subcategory()) {
        (Some(category), Some(sub)) => format!("{category} / {sub}"),
        (Some(category), None) => category.to_string(),
        (None, Some(sub)) => sub.to_string(),
        (None, None) => "All products".to_string(),
    };

    CatalogTemplate {
        page,
        products: filter
            .apply(&products)
            .into_iter()
            .map(|p| ProductView::new(p, &wishlist))
            .collect(),
        categories,
        heading,
        filtered: !filter.is_empty(),
        notice: notice_message(query.notice.as_deref()),
    }
}
