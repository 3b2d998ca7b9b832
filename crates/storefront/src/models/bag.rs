//! Shopping bag kept in the visitor session.
//!
//! The bag stores product ids and quantities only. Prices and titles come from
//! the catalog each time the bag is shown, so lines for products that have
//! since been deleted simply disappear.

use boutique_core::{CurrencyCode, Price, ProductId};
use serde::{Deserialize, Serialize};

use crate::catalog::Product;

/// Largest quantity a single bag line may hold.
pub const MAX_LINE_QUANTITY: u32 = 10;

/// One product in the bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BagLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Ordered list of bag lines, at most one per product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bag {
    lines: Vec<BagLine>,
}

const fn clamp_quantity(quantity: u32) -> u32 {
    if quantity < 1 {
        1
    } else if quantity > MAX_LINE_QUANTITY {
        MAX_LINE_QUANTITY
    } else {
        quantity
    }
}

impl Bag {
    /// Lines in the order they were added.
    #[must_use]
    pub fn lines(&self) -> &[BagLine] {
        &self.lines
    }

    /// Add `quantity` of a product, merging with an existing line.
    pub fn add(&mut self, product_id: ProductId, quantity: u32) {
        if let Some(line) = self.line_mut(product_id) {
            line.quantity = clamp_quantity(line.quantity.saturating_add(quantity));
        } else {
            self.lines.push(BagLine {
                product_id,
                quantity: clamp_quantity(quantity),
            });
        }
    }

    /// Set a line's quantity; zero removes the line.
    ///
    /// Returns `false` if the product is not in the bag.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(product_id);
        }
        match self.line_mut(product_id) {
            Some(line) => {
                line.quantity = clamp_quantity(quantity);
                true
            }
            None => false,
        }
    }

    /// Remove a product's line. Returns `false` if it was not in the bag.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.product_id != product_id);
        self.lines.len() != before
    }

    /// Empty the bag.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Total number of items across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Drop lines whose product is no longer in the catalog.
    ///
    /// Returns `true` if anything was dropped.
    pub fn retain_known(&mut self, products: &[Product]) -> bool {
        let before = self.lines.len();
        self.lines
            .retain(|line| products.iter().any(|p| p.id == line.product_id));
        self.lines.len() != before
    }

    /// Join the bag with catalog data for display.
    #[must_use]
    pub fn resolve(&self, products: &[Product], currency: CurrencyCode) -> ResolvedBag {
        let lines: Vec<ResolvedLine> = self
            .lines
            .iter()
            .filter_map(|line| {
                let product = products.iter().find(|p| p.id == line.product_id)?;
                Some(ResolvedLine {
                    line_total: product.price.times(line.quantity),
                    product: product.clone(),
                    quantity: line.quantity,
                })
            })
            .collect();
        let subtotal = lines
            .iter()
            .fold(Price::zero(currency), |sum, line| sum + line.line_total);

        ResolvedBag { lines, subtotal }
    }

    fn line_mut(&mut self, product_id: ProductId) -> Option<&mut BagLine> {
        self.lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
    }
}

/// A bag line joined with its product.
#[derive(Debug, Clone)]
pub struct ResolvedLine {
    pub product: Product,
    pub quantity: u32,
    pub line_total: Price,
}

/// The bag as displayed.
#[derive(Debug, Clone)]
pub struct ResolvedBag {
    pub lines: Vec<ResolvedLine>,
    pub subtotal: Price,
}

impl ResolvedBag {
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Whether any line refers to a product that has sold since it was added.
    #[must_use]
    pub fn has_sold_items(&self) -> bool {
        self.lines.iter().any(|line| line.product.sold)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::catalog::tests::product;

    fn id(n: i64) -> ProductId {
        ProductId::new(n)
    }

    #[test]
    fn test_add_merges_and_clamps() {
        let mut bag = Bag::default();
        bag.add(id(1), 2);
        bag.add(id(2), 0);
        bag.add(id(1), 3);
        assert_eq!(
            bag.lines(),
            &[
                BagLine { product_id: id(1), quantity: 5 },
                BagLine { product_id: id(2), quantity: 1 },
            ]
        );

        bag.add(id(1), 50);
        assert_eq!(bag.lines()[0].quantity, MAX_LINE_QUANTITY);
        assert_eq!(bag.item_count(), MAX_LINE_QUANTITY + 1);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut bag = Bag::default();
        bag.add(id(1), 2);
        assert!(bag.set_quantity(id(1), 4));
        assert_eq!(bag.item_count(), 4);
        assert!(bag.set_quantity(id(1), 0));
        assert!(bag.is_empty());
        assert!(!bag.set_quantity(id(9), 1));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut bag = Bag::default();
        bag.add(id(1), 1);
        bag.add(id(2), 1);
        assert!(bag.remove(id(1)));
        assert!(!bag.remove(id(1)));
        bag.clear();
        assert_eq!(bag.item_count(), 0);
    }

    #[test]
    fn test_subtotal_sums_price_times_quantity() {
        let mut shirt = product(1, "Shirt", "Clothing", None);
        shirt.price = Price::new(Decimal::new(1999, 2), CurrencyCode::USD);
        let mut scarf = product(2, "Scarf", "Accessories", None);
        scarf.price = Price::new(Decimal::new(500, 2), CurrencyCode::USD);
        let products = vec![shirt, scarf];

        let mut bag = Bag::default();
        bag.add(id(1), 2);
        bag.add(id(2), 3);
        let resolved = bag.resolve(&products, CurrencyCode::USD);
        assert_eq!(resolved.subtotal.display(), "$54.98");
        assert_eq!(resolved.item_count(), 5);
        assert_eq!(resolved.lines[0].line_total.display(), "$39.98");
    }

    #[test]
    fn test_stale_lines_are_dropped() {
        let products = vec![product(1, "Shirt", "Clothing", None)];
        let mut bag = Bag::default();
        bag.add(id(1), 1);
        bag.add(id(7), 2);

        let resolved = bag.resolve(&products, CurrencyCode::USD);
        assert_eq!(resolved.lines.len(), 1);

        assert!(bag.retain_known(&products));
        assert_eq!(bag.item_count(), 1);
        assert!(!bag.retain_known(&products));
    }

    #[test]
    fn test_empty_bag_subtotal_is_zero_in_store_currency() {
        let resolved = Bag::default().resolve(&[], CurrencyCode::GBP);
        assert_eq!(resolved.subtotal.display(), "£0.00");
    }
}
