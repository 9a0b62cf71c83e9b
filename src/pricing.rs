//! Pricing
//!
//! Unit prices, per-item discounts and order totals. Totals are always derived from the current
//! line items and never stored. Percentage discounts may leave fractions of a minor unit; they
//! are carried unrounded into the totals and only rounded when formatted.

use std::num::NonZeroU32;

use rust_decimal::Decimal;
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::{
    discounts::DiscountError,
    items::{LineItem, LineItemKind},
};

/// Errors that can occur while pricing line items.
#[derive(Debug, Error)]
pub enum PricingError {
    /// An item's price is in a different currency to the order (index, item currency, order
    /// currency).
    #[error("item {0} is priced in {1}, but the order is in {2}")]
    CurrencyMismatch(usize, &'static str, &'static str),

    /// A line total or order total does not fit in minor units.
    #[error("order total overflowed")]
    Overflow,

    /// Wrapped coupon arithmetic error.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Per-unit price and discount of a line item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemPricing<'a> {
    /// Price of one unit before discounts
    pub unit_price: Money<'a, Currency>,

    /// Discount on one unit, unrounded
    pub discount: Money<'a, Currency>,
}

impl<'a> ItemPricing<'a> {
    /// `(unit_price - discount) × quantity`, unrounded.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the line total does not fit.
    pub fn line_total(&self, quantity: NonZeroU32) -> Result<Money<'a, Currency>, PricingError> {
        let total = self
            .unit_price
            .amount()
            .checked_sub(*self.discount.amount())
            .and_then(|net| net.checked_mul(Decimal::from(quantity.get())))
            .ok_or(PricingError::Overflow)?;

        Ok(Money::from_decimal(total, self.unit_price.currency()))
    }
}

/// Totals over a list of line items.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderTotals<'a> {
    /// Sum of unit price × quantity
    pub original_price: Money<'a, Currency>,

    /// Sum of discount × quantity, unrounded
    pub total_discount: Money<'a, Currency>,

    /// Amount payable
    pub total_price: Money<'a, Currency>,
}

/// Order totals plus the number of units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderSummary<'a> {
    /// Price totals
    pub totals: OrderTotals<'a>,

    /// Sum of quantities
    pub total_quantity: u64,
}

/// Resolves the unit price and per-unit discount of a line item.
///
/// # Errors
///
/// - [`PricingError::Money`]: the option price is in another currency.
/// - [`PricingError::Discount`]: the coupon could not be applied to the unit price.
pub fn order_item_pricing<'a>(item: &LineItem<'a>) -> Result<ItemPricing<'a>, PricingError> {
    let unit_price = match item.kind() {
        LineItemKind::Product {
            product,
            selected_option,
        } => match selected_option {
            Some(option) => product.price.add(option.additional_price)?,
            None => product.price,
        },
        LineItemKind::Reform(reform) => reform.cost,
    };

    let discount = match item.applied_coupon() {
        Some(applied) => applied.coupon.rule.discount_for(&unit_price)?,
        None => Money::from_minor(0, unit_price.currency()),
    };

    Ok(ItemPricing {
        unit_price,
        discount,
    })
}

/// Calculates the totals of a list of line items in `currency`.
///
/// An empty list totals to zero.
///
/// # Errors
///
/// - [`PricingError::CurrencyMismatch`]: an item is priced in another currency.
/// - [`PricingError::Overflow`]: a total does not fit in minor units.
/// - [`PricingError::Discount`] / [`PricingError::Money`]: an item could not be priced.
pub fn calculate_order_totals<'a>(
    items: &[LineItem<'a>],
    currency: &'a Currency,
) -> Result<OrderTotals<'a>, PricingError> {
    let mut original_minor: i64 = 0;
    let mut discount = Decimal::ZERO;

    for (idx, item) in items.iter().enumerate() {
        let pricing = order_item_pricing(item)?;

        if pricing.unit_price.currency() != currency {
            return Err(PricingError::CurrencyMismatch(
                idx,
                pricing.unit_price.currency().iso_alpha_code,
                currency.iso_alpha_code,
            ));
        }

        let quantity = item.quantity().get();

        original_minor = pricing
            .unit_price
            .to_minor_units()
            .checked_mul(i64::from(quantity))
            .and_then(|line| original_minor.checked_add(line))
            .ok_or(PricingError::Overflow)?;

        discount = pricing
            .discount
            .amount()
            .checked_mul(Decimal::from(quantity))
            .and_then(|line| discount.checked_add(line))
            .ok_or(PricingError::Overflow)?;
    }

    let original_price = Money::from_minor(original_minor, currency);

    let total = original_price
        .amount()
        .checked_sub(discount)
        .ok_or(PricingError::Overflow)?;

    Ok(OrderTotals {
        original_price,
        total_discount: Money::from_decimal(discount, currency),
        total_price: Money::from_decimal(total, currency),
    })
}

/// Calculates the totals and the number of units.
///
/// # Errors
///
/// Returns a [`PricingError`] under the same conditions as [`calculate_order_totals`].
pub fn calculate_order_summary<'a>(
    items: &[LineItem<'a>],
    currency: &'a Currency,
) -> Result<OrderSummary<'a>, PricingError> {
    let totals = calculate_order_totals(items, currency)?;

    let total_quantity = items
        .iter()
        .map(|item| u64::from(item.quantity().get()))
        .sum();

    Ok(OrderSummary {
        totals,
        total_quantity,
    })
}
