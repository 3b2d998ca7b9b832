//! Wishlist kept in the visitor session.

use boutique_core::ProductId;
use serde::{Deserialize, Serialize};

use crate::catalog::Product;

/// Insertion-ordered set of saved products.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wishlist {
    items: Vec<ProductId>,
}

impl Wishlist {
    /// Add the product if absent, remove it if present.
    ///
    /// Returns `true` when the product is now on the wishlist.
    pub fn toggle(&mut self, product_id: ProductId) -> bool {
        if self.remove(product_id) {
            false
        } else {
            self.items.push(product_id);
            true
        }
    }

    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.items.contains(&product_id)
    }

    /// Returns `false` if the product was not on the wishlist.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|id| *id != product_id);
        self.items.len() != before
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn ids(&self) -> &[ProductId] {
        &self.items
    }

    /// Saved products still in the catalog, in the order they were saved.
    #[must_use]
    pub fn resolve(&self, products: &[Product]) -> Vec<Product> {
        self.items
            .iter()
            .filter_map(|id| products.iter().find(|p| p.id == *id).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::product;

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut wishlist = Wishlist::default();
        assert!(wishlist.toggle(ProductId::new(3)));
        assert!(wishlist.contains(ProductId::new(3)));
        assert!(!wishlist.toggle(ProductId::new(3)));
        assert!(wishlist.is_empty());
    }

    #[test]
    fn test_resolve_keeps_order_and_skips_missing() {
        let products = vec![
            product(1, "Shirt", "Clothing", None),
            product(2, "Scarf", "Accessories", None),
        ];
        let mut wishlist = Wishlist::default();
        wishlist.toggle(ProductId::new(2));
        wishlist.toggle(ProductId::new(5));
        wishlist.toggle(ProductId::new(1));

        let titles: Vec<String> = wishlist
            .resolve(&products)
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["Scarf", "Shirt"]);
        assert_eq!(wishlist.len(), 3);
    }
}
