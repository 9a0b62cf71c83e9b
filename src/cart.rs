//! Cart mutations
//!
//! Pure functions from one line-item list to the next. Inputs are never modified; callers hand
//! the result to the synchronizer to commit it.

use std::{borrow::Cow, num::NonZeroU32};

use crate::{
    coupons::AppliedCoupon,
    items::{IdGenerator, LineItem, LineItemId},
    products::{Product, ProductOption},
    reforms::ReformData,
};

/// Result of adding a product to a cart.
#[derive(Debug, Clone, PartialEq)]
pub struct AddProductOutcome<'a> {
    /// The next list of line items
    pub items: Vec<LineItem<'a>>,

    /// Whether an existing line absorbed the quantity
    pub was_existing_item: bool,
}

/// Adds `quantity` units of a product/option pair.
///
/// An existing product line with the same product and option absorbs the quantity; otherwise a
/// new line is appended with an id from `ids`.
pub fn add_product_to_cart<'a>(
    items: &[LineItem<'a>],
    product: &Product<'a>,
    option: Option<&ProductOption<'a>>,
    quantity: NonZeroU32,
    ids: &impl IdGenerator,
) -> AddProductOutcome<'a> {
    let key = (product.id, option.map(|option| option.id));

    let existing = items
        .iter()
        .position(|item| item.merge_key() == Some(key));

    let Some(existing) = existing else {
        let mut next = items.to_vec();

        next.push(LineItem::product(
            ids.product_id(product.id, option.map(|option| option.id)),
            product.clone(),
            option.cloned(),
            quantity,
        ));

        return AddProductOutcome {
            items: next,
            was_existing_item: false,
        };
    };

    let next = items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            if idx == existing {
                item.with_quantity(item.quantity().saturating_add(quantity.get()))
            } else {
                item.clone()
            }
        })
        .collect();

    AddProductOutcome {
        items: next,
        was_existing_item: true,
    }
}

/// Appends a reform line. Reforms never merge: each one is a distinct physical tie.
pub fn add_reform_to_cart<'a>(
    items: &[LineItem<'a>],
    reform: ReformData<'a>,
    quantity: NonZeroU32,
    ids: &impl IdGenerator,
) -> Vec<LineItem<'a>> {
    let mut next = items.to_vec();

    next.push(LineItem::reform(ids.reform_id(), reform, quantity));

    next
}

/// Removes the line with the given id. An unknown id leaves the list unchanged.
pub fn remove_cart_item<'a>(items: &[LineItem<'a>], id: &LineItemId) -> Vec<LineItem<'a>> {
    items
        .iter()
        .filter(|item| item.id() != id)
        .cloned()
        .collect()
}

/// Sets the quantity of the line with the given id.
///
/// A quantity below one is rejected by returning the input slice itself ([`Cow::Borrowed`]);
/// callers use that to skip a redundant write.
pub fn update_cart_item_quantity<'i, 'a>(
    items: &'i [LineItem<'a>],
    id: &LineItemId,
    new_quantity: u32,
) -> Cow<'i, [LineItem<'a>]> {
    let Some(quantity) = NonZeroU32::new(new_quantity) else {
        return Cow::Borrowed(items);
    };

    Cow::Owned(
        items
            .iter()
            .map(|item| {
                if item.id() == id {
                    item.with_quantity(quantity)
                } else {
                    item.clone()
                }
            })
            .collect(),
    )
}

/// Attaches `coupon` to the line with the given id, or clears it with `None`.
///
/// Only the targeted line changes; an item holds at most one coupon.
pub fn apply_cart_item_coupon<'a>(
    items: &[LineItem<'a>],
    id: &LineItemId,
    coupon: Option<AppliedCoupon<'a>>,
) -> Vec<LineItem<'a>> {
    items
        .iter()
        .map(|item| {
            if item.id() == id {
                item.with_coupon(coupon.clone())
            } else {
                item.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::ptr;

    use crate::{
        items::test_support::*,
        products::{OptionId, ProductId},
    };

    use super::*;

    fn sequential_ids(product: ProductId, option: Option<OptionId>) -> LineItemId {
        LineItemId(format!("{product}-{}", option.map_or(0, |o| o.0)))
    }

    #[test]
    fn adding_new_product_appends_line() {
        let items = [product_item("a", tie(1, 10_000), 1)];
        let product = tie(2, 20_000);

        let outcome = add_product_to_cart(&items, &product, None, qty(2), &sequential_ids);

        assert!(!outcome.was_existing_item);
        assert_eq!(outcome.items.len(), 2);

        let added = outcome.items.get(1);

        assert_eq!(added.map(|item| item.id().0.as_str()), Some("2-0"));
        assert_eq!(added.map(|item| item.quantity().get()), Some(2));
    }

    #[test]
    fn adding_same_product_and_option_merges_quantities() {
        let product = tie(1, 10_000);
        let option = product.options.first().cloned();

        let first = add_product_to_cart(&[], &product, option.as_ref(), qty(2), &sequential_ids);
        let second = add_product_to_cart(
            &first.items,
            &product,
            option.as_ref(),
            qty(3),
            &sequential_ids,
        );

        assert!(second.was_existing_item);
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items.first().map(|item| item.quantity().get()), Some(5));
    }

    #[test]
    fn merging_keeps_the_existing_line_untouched_otherwise() {
        let product = tie(1, 10_000);
        let coupon = fixed_coupon(1_000);
        let items = [product_item("line-1", product.clone(), 1).with_coupon(Some(coupon.clone()))];

        let outcome = add_product_to_cart(&items, &product, None, qty(1), &sequential_ids);

        let merged = outcome.items.first();

        assert_eq!(merged.map(|item| item.id().0.as_str()), Some("line-1"));
        assert_eq!(merged.and_then(|item| item.applied_coupon()), Some(&coupon));
    }

    #[test]
    fn same_product_with_different_option_is_a_new_line() {
        let product = tie(1, 10_000);
        let option = product.options.first().cloned();
        let items = [product_item("plain", product.clone(), 1)];

        let outcome = add_product_to_cart(&items, &product, option.as_ref(), qty(1), &sequential_ids);

        assert!(!outcome.was_existing_item);
        assert_eq!(outcome.items.len(), 2);
    }

    #[test]
    fn adding_does_not_modify_input() {
        let items = vec![product_item("a", tie(1, 10_000), 1)];
        let before = items.clone();

        let _outcome = add_product_to_cart(&items, &tie(1, 10_000), None, qty(4), &sequential_ids);

        assert_eq!(items, before);
    }

    #[test]
    fn reforms_are_never_merged() {
        let ids = |_: ProductId, _: Option<OptionId>| LineItemId::from("unused");

        let once = add_reform_to_cart(&[], reform_data(15_000), qty(1), &ids);
        let twice = add_reform_to_cart(&once, reform_data(15_000), qty(1), &ids);

        assert_eq!(twice.len(), 2);
        assert!(twice.iter().all(LineItem::is_reform_item));
        assert_ne!(twice.first().map(LineItem::id), twice.get(1).map(LineItem::id));
    }

    #[test]
    fn removing_present_id_drops_one_line() {
        let items = [
            product_item("a", tie(1, 10_000), 1),
            product_item("b", tie(2, 10_000), 1),
        ];

        let next = remove_cart_item(&items, &LineItemId::from("a"));

        assert_eq!(next.len(), 1);
        assert_eq!(next.first().map(|item| item.id().0.as_str()), Some("b"));
    }

    #[test]
    fn removing_absent_id_is_a_noop() {
        let items = [product_item("a", tie(1, 10_000), 1)];

        let next = remove_cart_item(&items, &LineItemId::from("missing"));

        assert_eq!(next, items);
    }

    #[test]
    fn zero_quantity_returns_the_same_slice() {
        let items = [product_item("a", tie(1, 10_000), 2)];

        let next = update_cart_item_quantity(&items, &LineItemId::from("a"), 0);

        assert!(matches!(next, Cow::Borrowed(_)));
        assert!(ptr::eq(&*next, items.as_slice()));
    }

    #[test]
    fn positive_quantity_replaces_the_quantity() {
        let items = [
            product_item("a", tie(1, 10_000), 2),
            product_item("b", tie(2, 10_000), 1),
        ];

        let next = update_cart_item_quantity(&items, &LineItemId::from("a"), 7);

        let quantities: Vec<u32> = next.iter().map(|item| item.quantity().get()).collect();

        assert!(matches!(next, Cow::Owned(_)));
        assert_eq!(quantities, vec![7, 1]);
    }

    #[test]
    fn applying_coupon_touches_only_the_target() {
        let items = [
            product_item("a", tie(1, 10_000), 1),
            product_item("b", tie(2, 10_000), 1),
        ];
        let coupon = fixed_coupon(2_000);

        let next = apply_cart_item_coupon(&items, &LineItemId::from("b"), Some(coupon.clone()));

        assert_eq!(next.first(), items.first());
        assert_eq!(next.get(1).and_then(LineItem::applied_coupon), Some(&coupon));
        assert_eq!(
            next.get(1).and_then(LineItem::applied_coupon_id),
            Some(coupon.coupon.id)
        );
    }

    #[test]
    fn applying_none_clears_the_coupon() {
        let items = [product_item("a", tie(1, 10_000), 1).with_coupon(Some(fixed_coupon(500)))];

        let next = apply_cart_item_coupon(&items, &LineItemId::from("a"), None);

        assert_eq!(next.first().and_then(LineItem::applied_coupon), None);
    }

    #[test]
    fn applying_coupon_to_absent_id_is_a_noop() {
        let items = [product_item("a", tie(1, 10_000), 1)];

        let next = apply_cart_item_coupon(&items, &LineItemId::from("zzz"), Some(fixed_coupon(1)));

        assert_eq!(next, items);
    }
}
