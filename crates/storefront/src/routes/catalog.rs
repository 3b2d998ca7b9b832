//! Category gallery and printable catalog.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{RawQuery, State},
    response::IntoResponse,
};
use chrono::Utc;
use tracing::instrument;

use crate::catalog::{GalleryTile, PrintSection, gallery, printable_catalog, showcase_gallery};
use crate::filters;
use crate::middleware::Page;
use crate::state::AppState;

/// Category gallery page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/categories.html")]
pub struct CategoriesTemplate {
    pub page: Page,
    pub tiles: Vec<GalleryTile>,
    /// No product is listed yet; `tiles` are placeholders.
    pub showcase: bool,
}

/// Printable catalog template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/print.html")]
pub struct PrintTemplate {
    pub page: Page,
    pub sections: Vec<PrintSection>,
    pub generated_on: String,
}

/// Display the category gallery with the print selection form.
#[instrument(skip(state, page))]
pub async fn categories(State(state): State<AppState>, page: Page) -> impl IntoResponse {
    let products = state.catalog().products().await;
    let tiles = gallery(&products);
    let showcase = tiles.is_empty();
    CategoriesTemplate {
        page,
        tiles: if showcase { showcase_gallery() } else { tiles },
        showcase,
    }
}

/// Display the printable catalog for the selected categories.
///
/// The selection arrives as repeated `category` keys
/// (`?category=Dresses&category=Bags`); none means every category.
#[instrument(skip(state, page))]
pub async fn print(
    State(state): State<AppState>,
    page: Page,
    RawQuery(query): RawQuery,
) -> impl IntoResponse {
    let selected = selected_categories(query.as_deref());
    let products = state.catalog().products().await;

    PrintTemplate {
        page,
        sections: printable_catalog(&products, &selected),
        generated_on: Utc::now().format("%B %-d, %Y").to_string(),
    }
}

/// Every `category` value of a query string, in order.
fn selected_categories(query: Option<&str>) -> Vec<String> {
    query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .filter(|(key, _)| key == "category")
                .map(|(_, value)| value.into_owned())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_categories_keeps_repeated_keys() {
        assert_eq!(
            selected_categories(Some("category=Bags&x=1&category=Silk+Scarves&category=%C3%89t%C3%A9")),
            vec!["Bags", "Silk Scarves", "Été"]
        );
        assert!(selected_categories(None).is_empty());
    }
}
