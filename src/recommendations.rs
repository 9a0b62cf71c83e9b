//! Recommendations
//!
//! A similarity filter over the catalog, not a ranked recommender: products qualify by sharing
//! any attribute with something already in the cart.

use rustc_hash::FxHashSet;

use crate::{
    items::LineItem,
    products::{Product, ProductId},
};

/// Returns up to `limit` catalog products related to the cart's product items, in catalog order.
///
/// A catalog product qualifies when it is not already in the cart and shares its category, color,
/// pattern or material with at least one cart product. Carts without product items get nothing.
pub fn recommended_products<'c, 'a>(
    cart_items: &[LineItem<'_>],
    catalog: &'c [Product<'a>],
    limit: usize,
) -> Vec<&'c Product<'a>> {
    let cart_products: Vec<&Product<'_>> = cart_items
        .iter()
        .filter_map(LineItem::as_product)
        .collect();

    if cart_products.is_empty() {
        return Vec::new();
    }

    let in_cart: FxHashSet<ProductId> = cart_products.iter().map(|product| product.id).collect();
    let profile = AttributeProfile::from_products(&cart_products);

    catalog
        .iter()
        .filter(|product| !in_cart.contains(&product.id))
        .filter(|product| profile.shares_any(product))
        .take(limit)
        .collect()
}

/// Attribute values seen across the cart's products.
#[derive(Debug, Default)]
struct AttributeProfile<'p> {
    categories: FxHashSet<&'p str>,
    colors: FxHashSet<&'p str>,
    patterns: FxHashSet<&'p str>,
    materials: FxHashSet<&'p str>,
}

impl<'p> AttributeProfile<'p> {
    fn from_products(products: &[&'p Product<'_>]) -> Self {
        let mut profile = Self::default();

        for &product in products {
            let attributes = product.attributes();

            profile.categories.extend(attributes.category);
            profile.colors.extend(attributes.color);
            profile.patterns.extend(attributes.pattern);
            profile.materials.extend(attributes.material);
        }

        profile
    }

    fn shares_any(&self, product: &Product<'_>) -> bool {
        let attributes = product.attributes();

        matches_any(&self.categories, attributes.category)
            || matches_any(&self.colors, attributes.color)
            || matches_any(&self.patterns, attributes.pattern)
            || matches_any(&self.materials, attributes.material)
    }
}

fn matches_any(seen: &FxHashSet<&str>, value: Option<&str>) -> bool {
    value.is_some_and(|value| seen.contains(value))
}

#[cfg(test)]
mod tests {
    use crate::items::test_support::*;

    use super::*;

    fn attributed(id: u64, category: &str, color: &str, pattern: &str, material: &str) -> Product<'static> {
        let mut product = tie(id, 30_000);

        product.category = Some(category.to_string());
        product.color = Some(color.to_string());
        product.pattern = Some(pattern.to_string());
        product.material = Some(material.to_string());

        product
    }

    fn catalog() -> Vec<Product<'static>> {
        vec![
            attributed(1, "classic", "navy", "solid", "silk"),
            attributed(2, "classic", "red", "stripe", "wool"),
            attributed(3, "skinny", "navy", "dot", "cotton"),
            attributed(4, "skinny", "green", "paisley", "linen"),
            attributed(5, "bow", "black", "solid", "polyester"),
            attributed(6, "knit", "grey", "check", "silk"),
        ]
    }

    fn ids(products: &[&Product<'_>]) -> Vec<u64> {
        products.iter().map(|product| product.id.0).collect()
    }

    #[test]
    fn empty_cart_gets_nothing() {
        let catalog = catalog();

        assert!(recommended_products(&[], &catalog, 10).is_empty());
    }

    #[test]
    fn reform_only_cart_gets_nothing() {
        let catalog = catalog();
        let cart = [reform_item("r", 15_000, 1)];

        assert!(recommended_products(&cart, &catalog, 10).is_empty());
    }

    #[test]
    fn any_shared_attribute_qualifies_in_catalog_order() {
        let catalog = catalog();
        let cart = [product_item("a", attributed(1, "classic", "navy", "solid", "silk"), 1)];

        let recommended = recommended_products(&cart, &catalog, 10);

        // 2: category, 3: color, 5: pattern, 6: material. 4 shares nothing.
        assert_eq!(ids(&recommended), vec![2, 3, 5, 6]);
    }

    #[test]
    fn cart_products_are_excluded() {
        let catalog = catalog();
        let cart = [
            product_item("a", attributed(1, "classic", "navy", "solid", "silk"), 1),
            product_item("b", attributed(3, "skinny", "navy", "dot", "cotton"), 1),
        ];

        let recommended = recommended_products(&cart, &catalog, 10);

        assert!(!ids(&recommended).contains(&1));
        assert!(!ids(&recommended).contains(&3));
        assert_eq!(ids(&recommended), vec![2, 4, 5, 6]);
    }

    #[test]
    fn results_are_truncated_to_limit() {
        let catalog = catalog();
        let cart = [product_item("a", attributed(1, "classic", "navy", "solid", "silk"), 1)];

        assert_eq!(ids(&recommended_products(&cart, &catalog, 2)), vec![2, 3]);
        assert!(recommended_products(&cart, &catalog, 0).is_empty());
    }

    #[test]
    fn missing_attributes_never_match() {
        let catalog = vec![tie(10, 10_000), tie(11, 10_000)];
        let cart = [product_item("a", tie(12, 10_000), 1)];

        assert!(recommended_products(&cart, &catalog, 10).is_empty());
    }
}
