//! Storefront cart prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{
        AddProductOutcome, add_product_to_cart, add_reform_to_cart, apply_cart_item_coupon,
        remove_cart_item, update_cart_item_quantity,
    },
    controller::{CartController, CartError, ErrorReporter},
    coupons::{AppliedCoupon, Coupon, CouponError, CouponRecord, DiscountRule},
    discounts::DiscountError,
    items::{
        IdGenerator, LineItem, LineItemId, LineItemKind, OrderItem, UuidIdGenerator,
        is_product_item, is_reform_item,
    },
    pricing::{
        ItemPricing, OrderSummary, OrderTotals, PricingError, calculate_order_summary,
        calculate_order_totals, order_item_pricing,
    },
    products::{OptionId, Product, ProductId, ProductOption},
    receipt::{CartSummary, SummaryError},
    recommendations::recommended_products,
    reforms::{Measurement, ReformData, TieId, TieItem},
    sync::{
        CartCache, CartItems, CartKey, CartStore, CartStores, MemoryCartCache, MemoryCartStore,
        Session, StoreError, SyncError, SyncRequest, sync_cart_items_with_rollback,
    },
    uuids::{CouponUuid, IssuanceUuid, UserUuid},
};
