//! Product catalog: the in-memory product list and the views derived from it.
//!
//! The list is fetched from the backend and cached with `moka` for the
//! configured TTL. When a refetch fails the last successful list is served
//! instead, so pages keep rendering while the backend is unreachable.
//! Admin writes are applied to the local list directly (prepend, replace,
//! remove) so the author sees the change without waiting for the TTL.

mod filter;
mod print;

pub use filter::{
    CatalogFilter, CategoryNode, GalleryTile, category_tree, gallery, same_label, showcase_gallery,
};
pub use print::{PrintGroup, PrintSection, printable_catalog};

use std::sync::Arc;

use boutique_core::{CurrencyCode, Price, ProductId};
use chrono::{DateTime, Utc};
use moka::future::Cache;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::backend::{BackendClient, BackendError, ProductRow};
use crate::config::StoreConfig;

/// Category used for products saved without one.
pub const UNCATEGORIZED: &str = "Other";

const PRODUCTS_KEY: &str = "products";

/// A product as displayed by the storefront.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub price: Price,
    pub category: String,
    pub subcategory: Option<String>,
    pub availability: Option<String>,
    pub image_url: Option<String>,
    pub sold: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Convert a table row, pricing it in the store currency.
    #[must_use]
    pub fn from_row(row: ProductRow, currency: CurrencyCode) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description.unwrap_or_default(),
            price: Price::new(row.price, currency),
            category: non_empty(row.category).unwrap_or_else(|| UNCATEGORIZED.to_string()),
            subcategory: non_empty(row.subcategory),
            availability: non_empty(row.availability),
            image_url: non_empty(row.image_url),
            sold: row.sold,
            created_at: row.created_at,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Catalog
// =============================================================================

/// Shared product list with a TTL cache and a last-good fallback.
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    backend: BackendClient,
    currency: CurrencyCode,
    cache: Cache<&'static str, Arc<Vec<Product>>>,
    snapshot: RwLock<Arc<Vec<Product>>>,
}

impl Catalog {
    /// Create an empty catalog; the first read fetches from the backend.
    #[must_use]
    pub fn new(backend: BackendClient, store: &StoreConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(store.catalog_ttl)
            .build();

        Self {
            inner: Arc::new(CatalogInner {
                backend,
                currency: store.currency,
                cache,
                snapshot: RwLock::new(Arc::new(Vec::new())),
            }),
        }
    }

    /// Current product list, newest first.
    ///
    /// Never fails: a backend error falls back to the last successful fetch.
    pub async fn products(&self) -> Arc<Vec<Product>> {
        if let Some(products) = self.inner.cache.get(PRODUCTS_KEY).await {
            return products;
        }

        match self.refresh().await {
            Ok(products) => products,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch products, serving last snapshot");
                self.inner.snapshot.read().await.clone()
            }
        }
    }

    /// Refetch the product list from the backend.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the cached list is left untouched.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Arc<Vec<Product>>, BackendError> {
        let rows = self.inner.backend.list_products().await?;
        let products: Arc<Vec<Product>> = Arc::new(
            rows.into_iter()
                .map(|row| Product::from_row(row, self.inner.currency))
                .collect(),
        );
        tracing::debug!(count = products.len(), "Fetched products");

        *self.inner.snapshot.write().await = Arc::clone(&products);
        self.inner
            .cache
            .insert(PRODUCTS_KEY, Arc::clone(&products))
            .await;
        Ok(products)
    }

    /// Find a product by id.
    pub async fn find(&self, id: ProductId) -> Option<Product> {
        self.products().await.iter().find(|p| p.id == id).cloned()
    }

    /// Convert a row written by the admin panel.
    #[must_use]
    pub fn product_from_row(&self, row: ProductRow) -> Product {
        Product::from_row(row, self.inner.currency)
    }

    /// Put a newly created product at the front of the list.
    pub async fn apply_insert(&self, product: Product) {
        self.modify(|products| {
            products.retain(|p| p.id != product.id);
            products.insert(0, product);
        })
        .await;
    }

    /// Replace a product in place (prepends it if it is not in the list).
    pub async fn apply_update(&self, product: Product) {
        self.modify(|products| {
            if let Some(slot) = products.iter_mut().find(|p| p.id == product.id) {
                *slot = product;
            } else {
                products.insert(0, product);
            }
        })
        .await;
    }

    /// Remove a product from the list.
    pub async fn apply_delete(&self, id: ProductId) {
        self.modify(|products| products.retain(|p| p.id != id)).await;
    }

    /// Apply a local write. Last write wins.
    async fn modify(&self, f: impl FnOnce(&mut Vec<Product>)) {
        let mut guard = self.inner.snapshot.write().await;
        let mut next = guard.as_ref().clone();
        f(&mut next);
        let next = Arc::new(next);
        *guard = Arc::clone(&next);
        drop(guard);

        // Only refresh a live cache entry; an expired one refetches anyway.
        if self.inner.cache.contains_key(PRODUCTS_KEY) {
            self.inner.cache.insert(PRODUCTS_KEY, next).await;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::config::tests::test_config;

    /// Build a product for tests.
    pub(crate) fn product(id: i64, title: &str, category: &str, subcategory: Option<&str>) -> Product {
        Product {
            id: ProductId::new(id),
            title: title.to_string(),
            description: String::new(),
            price: Price::new(Decimal::new(1000 + id, 2), CurrencyCode::USD),
            category: category.to_string(),
            subcategory: subcategory.map(str::to_string),
            availability: None,
            image_url: None,
            sold: false,
            created_at: None,
        }
    }

    fn offline_catalog() -> Catalog {
        let config = test_config();
        Catalog::new(BackendClient::new(&config.backend), &config.store)
    }

    #[test]
    fn test_from_row_normalizes_blank_columns() {
        let row: ProductRow = serde_json::from_str(
            r#"{"id":3,"title":"Tote","price":"25.00","category":"  ","subcategory":"",
                "image_url":" https://cdn.test/t.png "}"#,
        )
        .unwrap_or_else(|e| panic!("row should parse: {e}"));
        let product = Product::from_row(row, CurrencyCode::EUR);
        assert_eq!(product.category, UNCATEGORIZED);
        assert!(product.subcategory.is_none());
        assert_eq!(product.image_url.as_deref(), Some("https://cdn.test/t.png"));
        assert_eq!(product.price.display(), "€25.00");
    }

    #[tokio::test]
    async fn test_unreachable_backend_serves_empty_snapshot() {
        let catalog = offline_catalog();
        assert!(catalog.products().await.is_empty());
        assert!(catalog.refresh().await.is_err());
    }

    #[tokio::test]
    async fn test_local_writes_update_snapshot() {
        let catalog = offline_catalog();
        catalog.apply_insert(product(1, "Scarf", "Accessories", None)).await;
        catalog.apply_insert(product(2, "Dress", "Clothing", None)).await;

        let titles: Vec<String> = catalog
            .products()
            .await
            .iter()
            .map(|p| p.title.clone())
            .collect();
        assert_eq!(titles, vec!["Dress", "Scarf"]);

        let mut edited = product(1, "Silk Scarf", "Accessories", None);
        edited.sold = true;
        catalog.apply_update(edited).await;
        let found = catalog.find(ProductId::new(1)).await;
        assert_eq!(found.map(|p| (p.title, p.sold)), Some(("Silk Scarf".to_string(), true)));

        catalog.apply_delete(ProductId::new(2)).await;
        assert_eq!(catalog.products().await.len(), 1);
        assert!(catalog.find(ProductId::new(2)).await.is_none());
    }
}
