//! Printable catalog: unsold products of the selected categories, grouped by
//! subcategory.

use super::Product;
use super::filter::{category_tree, label_key, same_label};

/// One category of the printable catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintSection {
    pub category: String,
    pub groups: Vec<PrintGroup>,
}

impl PrintSection {
    /// Number of products in the section.
    #[must_use]
    pub fn product_count(&self) -> usize {
        self.groups.iter().map(|g| g.products.len()).sum()
    }
}

/// Products sharing a subcategory. `None` is the unnamed group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintGroup {
    pub subcategory: Option<String>,
    pub products: Vec<Product>,
}

/// Build the printable catalog for `selected` category names.
///
/// Sections follow the order of `selected` (duplicates and unknown names are
/// skipped); an empty selection means every category in tree order. Sold
/// products are left out and categories with nothing left are omitted.
#[must_use]
pub fn printable_catalog(products: &[Product], selected: &[String]) -> Vec<PrintSection> {
    let tree = category_tree(products);

    let mut wanted: Vec<String> = Vec::new();
    if selected.iter().all(|s| s.trim().is_empty()) {
        wanted.extend(tree.iter().map(|node| node.name.clone()));
    } else {
        for name in selected {
            let Some(node) = tree.iter().find(|node| same_label(&node.name, name)) else {
                continue;
            };
            if !wanted.contains(&node.name) {
                wanted.push(node.name.clone());
            }
        }
    }

    wanted
        .into_iter()
        .filter_map(|category| {
            let node = tree.iter().find(|node| node.name == category)?;
            let in_stock: Vec<&Product> = products
                .iter()
                .filter(|p| !p.sold && same_label(&p.category, &category))
                .collect();
            if in_stock.is_empty() {
                return None;
            }

            let mut groups = Vec::with_capacity(node.subcategories.len() + 1);
            let unnamed: Vec<Product> = in_stock
                .iter()
                .filter(|p| p.subcategory.is_none())
                .map(|p| (*p).clone())
                .collect();
            if !unnamed.is_empty() {
                groups.push(PrintGroup {
                    subcategory: None,
                    products: unnamed,
                });
            }
            for sub in &node.subcategories {
                let key = label_key(sub);
                let members: Vec<Product> = in_stock
                    .iter()
                    .filter(|p| p.subcategory.as_deref().is_some_and(|s| label_key(s) == key))
                    .map(|p| (*p).clone())
                    .collect();
                if !members.is_empty() {
                    groups.push(PrintGroup {
                        subcategory: Some(sub.clone()),
                        products: members,
                    });
                }
            }

            Some(PrintSection { category, groups })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::product;

    fn sample() -> Vec<Product> {
        let mut sold = product(6, "Sold Bag", "Bags", None);
        sold.sold = true;
        vec![
            product(1, "Silk Scarf", "Accessories", Some("Scarves")),
            product(2, "Linen Shirt", "Clothing", Some("Shirts")),
            product(3, "Pin", "Accessories", None),
            product(4, "Belt", "Accessories", Some("Belts")),
            product(5, "Maxi Dress", "Clothing", None),
            sold,
        ]
    }

    fn section_names(sections: &[PrintSection]) -> Vec<&str> {
        sections.iter().map(|s| s.category.as_str()).collect()
    }

    #[test]
    fn test_sections_follow_selection_order() {
        let sections = printable_catalog(
            &sample(),
            &["clothing".to_string(), "Accessories".to_string(), "CLOTHING".to_string()],
        );
        assert_eq!(section_names(&sections), vec!["Clothing", "Accessories"]);
    }

    #[test]
    fn test_empty_selection_prints_every_category() {
        let sections = printable_catalog(&sample(), &[]);
        // Bags only holds a sold product.
        assert_eq!(section_names(&sections), vec!["Accessories", "Clothing"]);
    }

    #[test]
    fn test_unnamed_group_comes_first() {
        let sections = printable_catalog(&sample(), &["Accessories".to_string()]);
        let groups: Vec<Option<&str>> = sections[0]
            .groups
            .iter()
            .map(|g| g.subcategory.as_deref())
            .collect();
        assert_eq!(groups, vec![None, Some("Belts"), Some("Scarves")]);
        assert_eq!(sections[0].product_count(), 3);
    }

    #[test]
    fn test_sold_products_are_excluded() {
        let sections = printable_catalog(&sample(), &["Bags".to_string(), "Nope".to_string()]);
        assert!(sections.is_empty());
    }
}
