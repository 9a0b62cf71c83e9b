//! Line items
//!
//! A cart (or order) is a list of line items. Each item is either a catalog product purchase or a
//! custom reform, and the variant is fixed for the item's lifetime.

use std::{fmt, num::NonZeroU32};

use crate::{
    coupons::AppliedCoupon,
    products::{OptionId, Product, ProductId, ProductOption},
    reforms::ReformData,
    uuids::CouponUuid,
};

/// Line item identifier, unique within a cart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineItemId(pub String);

impl fmt::Display for LineItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LineItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// What a line item is for.
#[derive(Debug, Clone, PartialEq)]
pub enum LineItemKind<'a> {
    /// A catalog product, with the option chosen at add time.
    Product {
        /// Copy of the catalog product
        product: Product<'a>,

        /// Chosen option, if any
        selected_option: Option<ProductOption<'a>>,
    },

    /// A custom reform configuration.
    Reform(ReformData<'a>),
}

/// One entry in a cart or order.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem<'a> {
    id: LineItemId,
    quantity: NonZeroU32,
    applied_coupon: Option<AppliedCoupon<'a>>,
    kind: LineItemKind<'a>,
}

/// Orders carry the same shape as cart items.
pub type OrderItem<'a> = LineItem<'a>;

impl<'a> LineItem<'a> {
    /// Creates a product line item.
    #[must_use]
    pub fn product(
        id: LineItemId,
        product: Product<'a>,
        selected_option: Option<ProductOption<'a>>,
        quantity: NonZeroU32,
    ) -> Self {
        Self {
            id,
            quantity,
            applied_coupon: None,
            kind: LineItemKind::Product {
                product,
                selected_option,
            },
        }
    }

    /// Creates a reform line item.
    #[must_use]
    pub fn reform(id: LineItemId, reform: ReformData<'a>, quantity: NonZeroU32) -> Self {
        Self {
            id,
            quantity,
            applied_coupon: None,
            kind: LineItemKind::Reform(reform),
        }
    }

    /// Returns the item's identifier.
    pub fn id(&self) -> &LineItemId {
        &self.id
    }

    /// Returns the quantity; always at least one.
    pub fn quantity(&self) -> NonZeroU32 {
        self.quantity
    }

    /// Returns the attached coupon.
    pub fn applied_coupon(&self) -> Option<&AppliedCoupon<'a>> {
        self.applied_coupon.as_ref()
    }

    /// Returns the attached coupon's id. Derived from the coupon so the two never disagree.
    pub fn applied_coupon_id(&self) -> Option<CouponUuid> {
        self.applied_coupon.as_ref().map(|applied| applied.coupon.id)
    }

    /// Returns what the item is for.
    pub fn kind(&self) -> &LineItemKind<'a> {
        &self.kind
    }

    /// Returns the merge identity of a product item. Reform items have none.
    pub fn merge_key(&self) -> Option<(ProductId, Option<OptionId>)> {
        match &self.kind {
            LineItemKind::Product {
                product,
                selected_option,
            } => Some((product.id, selected_option.as_ref().map(|option| option.id))),
            LineItemKind::Reform(_) => None,
        }
    }

    /// Returns the product for product items.
    pub fn as_product(&self) -> Option<&Product<'a>> {
        match &self.kind {
            LineItemKind::Product { product, .. } => Some(product),
            LineItemKind::Reform(_) => None,
        }
    }

    /// True for catalog product items.
    pub fn is_product_item(&self) -> bool {
        match self.kind {
            LineItemKind::Product { .. } => true,
            LineItemKind::Reform(_) => false,
        }
    }

    /// True for reform items.
    pub fn is_reform_item(&self) -> bool {
        match self.kind {
            LineItemKind::Product { .. } => false,
            LineItemKind::Reform(_) => true,
        }
    }

    /// Returns a copy with a different quantity.
    #[must_use]
    pub fn with_quantity(&self, quantity: NonZeroU32) -> Self {
        Self {
            quantity,
            ..self.clone()
        }
    }

    /// Returns a copy with the coupon set or cleared.
    #[must_use]
    pub fn with_coupon(&self, applied_coupon: Option<AppliedCoupon<'a>>) -> Self {
        Self {
            applied_coupon,
            ..self.clone()
        }
    }
}

/// Free-function form of [`LineItem::is_product_item`], handy as a filter predicate.
pub fn is_product_item(item: &LineItem<'_>) -> bool {
    item.is_product_item()
}

/// Free-function form of [`LineItem::is_reform_item`], handy as a filter predicate.
pub fn is_reform_item(item: &LineItem<'_>) -> bool {
    item.is_reform_item()
}

/// Produces line item ids.
///
/// Implementations must not collide with ids already in the cart.
pub trait IdGenerator {
    /// Id for a new product line.
    fn product_id(&self, product: ProductId, option: Option<OptionId>) -> LineItemId;

    /// Id for a new reform line.
    fn reform_id(&self) -> LineItemId {
        LineItemId(format!("reform-{}", uuid::Uuid::now_v7()))
    }
}

impl<F> IdGenerator for F
where
    F: Fn(ProductId, Option<OptionId>) -> LineItemId,
{
    fn product_id(&self, product: ProductId, option: Option<OptionId>) -> LineItemId {
        self(product, option)
    }
}

/// Generates `{product}-{option}-{uuid}` ids, with `base` standing in for "no option".
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn product_id(&self, product: ProductId, option: Option<OptionId>) -> LineItemId {
        let option = option.map_or_else(|| "base".to_string(), |option| option.to_string());

        LineItemId(format!("{product}-{option}-{}", uuid::Uuid::now_v7()))
    }
}
