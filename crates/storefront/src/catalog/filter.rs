//! Category filtering, the category tree and the category gallery.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::Product;

/// Query parameters narrowing the catalog page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogFilter {
    pub category: Option<String>,
    pub subcategory: Option<String>,
}

impl CatalogFilter {
    /// Category to match, if one was given.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        given(self.category.as_deref())
    }

    /// Subcategory to match, if one was given.
    #[must_use]
    pub fn subcategory(&self) -> Option<&str> {
        given(self.subcategory.as_deref())
    }

    /// True when the filter lets every product through.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.category().is_none() && self.subcategory().is_none()
    }

    /// Whether `product` passes the filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let category_ok = self
            .category()
            .is_none_or(|wanted| same_label(wanted, &product.category));
        let subcategory_ok = self.subcategory().is_none_or(|wanted| {
            product
                .subcategory
                .as_deref()
                .is_some_and(|sub| same_label(wanted, sub))
        });
        category_ok && subcategory_ok
    }

    /// Products passing the filter, in catalog order.
    #[must_use]
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        products.iter().filter(|p| self.matches(p)).collect()
    }
}

fn given(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Case- and whitespace-insensitive label comparison.
#[must_use]
pub fn same_label(a: &str, b: &str) -> bool {
    label_key(a) == label_key(b)
}

pub(super) fn label_key(label: &str) -> String {
    label.trim().to_lowercase()
}

// =============================================================================
// Category tree
// =============================================================================

/// A category with its subcategories, as shown in navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryNode {
    pub name: String,
    pub subcategories: Vec<String>,
    pub product_count: usize,
}

/// Distinct categories, alphabetical, each with its distinct subcategories.
///
/// Labels that differ only in case or surrounding whitespace are merged; the
/// first spelling in catalog order is kept.
#[must_use]
pub fn category_tree(products: &[Product]) -> Vec<CategoryNode> {
    struct Entry {
        name: String,
        subcategories: BTreeMap<String, String>,
        product_count: usize,
    }

    let mut categories: BTreeMap<String, Entry> = BTreeMap::new();
    for product in products {
        let entry = categories
            .entry(label_key(&product.category))
            .or_insert_with(|| Entry {
                name: product.category.trim().to_string(),
                subcategories: BTreeMap::new(),
                product_count: 0,
            });
        entry.product_count += 1;
        if let Some(sub) = product.subcategory.as_deref() {
            entry
                .subcategories
                .entry(label_key(sub))
                .or_insert_with(|| sub.trim().to_string());
        }
    }

    categories
        .into_values()
        .map(|entry| CategoryNode {
            name: entry.name,
            subcategories: entry.subcategories.into_values().collect(),
            product_count: entry.product_count,
        })
        .collect()
}

// =============================================================================
// Gallery
// =============================================================================

/// One tile of the category gallery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryTile {
    pub category: String,
    pub product_count: usize,
    /// First image in catalog order within the category.
    pub cover_image: Option<String>,
}

/// Gallery tiles in category-tree order.
#[must_use]
pub fn gallery(products: &[Product]) -> Vec<GalleryTile> {
    category_tree(products)
        .into_iter()
        .map(|node| {
            let cover_image = products
                .iter()
                .filter(|p| same_label(&p.category, &node.name))
                .find_map(|p| p.image_url.clone());
            GalleryTile {
                category: node.name,
                product_count: node.product_count,
                cover_image,
            }
        })
        .collect()
}

/// Gallery categories shown before any product has been listed.
pub const SHOWCASE_CATEGORIES: [&str; 4] = [
    "Women's Jewelry",
    "Men's Jewelry",
    "Women's Clothing",
    "Men's Clothing",
];

/// Placeholder gallery built from [`SHOWCASE_CATEGORIES`].
#[must_use]
pub fn showcase_gallery() -> Vec<GalleryTile> {
    SHOWCASE_CATEGORIES
        .iter()
        .map(|name| GalleryTile {
            category: (*name).to_string(),
            product_count: 0,
            cover_image: None,
        })
        .collect()
}
