//! Coupons

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    discounts::{DiscountError, amount_off, percentage_off},
    uuids::{CouponUuid, IssuanceUuid},
};

/// Errors raised while converting a raw coupon record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CouponError {
    /// The discount type was neither `percentage` nor `fixed`.
    #[error("unknown discount type: {0}")]
    UnknownDiscountType(String),

    /// A percentage coupon outside `0..=100`.
    #[error("percentage discount must be between 0 and 100, got {0}")]
    PercentageOutOfRange(i64),

    /// A negative fixed amount or cap.
    #[error("discount amounts cannot be negative, got {0}")]
    NegativeAmount(i64),
}

/// How a coupon reduces the unit price of the item it is attached to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiscountRule<'a> {
    /// A percentage of the unit price, optionally capped.
    Percentage {
        /// Fraction of the unit price taken off
        percent: Percentage,

        /// Upper bound on the discount per unit
        max_discount: Option<Money<'a, Currency>>,
    },

    /// A fixed amount off the unit price.
    Fixed {
        /// Amount taken off each unit
        amount: Money<'a, Currency>,
    },
}

impl<'a> DiscountRule<'a> {
    /// Resolves the per-unit discount for the given unit price.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] if the percentage cannot be applied or an amount is in another
    /// currency.
    pub fn discount_for(
        &self,
        unit_price: &Money<'a, Currency>,
    ) -> Result<Money<'a, Currency>, DiscountError> {
        match self {
            DiscountRule::Percentage {
                percent,
                max_discount,
            } => percentage_off(unit_price, percent, max_discount.as_ref()),
            DiscountRule::Fixed { amount } => amount_off(unit_price, amount),
        }
    }
}

/// Coupon definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Coupon<'a> {
    /// Coupon identifier
    pub id: CouponUuid,

    /// Display name
    pub name: String,

    /// Discount arithmetic
    pub rule: DiscountRule<'a>,
}

/// A coupon issued to a user and attached to a line item.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedCoupon<'a> {
    /// The user's issuance record
    pub issuance_id: IssuanceUuid,

    /// The coupon it refers to
    pub coupon: Coupon<'a>,
}

impl<'a> AppliedCoupon<'a> {
    /// Wraps a coupon in a freshly identified issuance.
    #[must_use]
    pub fn issue(coupon: Coupon<'a>) -> Self {
        Self {
            issuance_id: IssuanceUuid::now_v7(),
            coupon,
        }
    }
}

/// Coupon as handed over by the coupon service, amounts in minor units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponRecord {
    /// Coupon identifier
    pub id: CouponUuid,

    /// Display name
    pub name: String,

    /// `percentage` or `fixed`
    pub discount_type: String,

    /// Percent points for percentage coupons, minor units for fixed ones
    pub discount_value: i64,

    /// Cap for percentage coupons, in minor units
    pub max_discount_amount: Option<i64>,
}

impl CouponRecord {
    /// Converts the record into a [`Coupon`] priced in `currency`.
    ///
    /// # Errors
    ///
    /// Returns a [`CouponError`] if the discount type is unknown or a value is out of range.
    pub fn into_coupon(self, currency: &'static Currency) -> Result<Coupon<'static>, CouponError> {
        let rule = match self.discount_type.as_str() {
            "percentage" => {
                if !(0..=100).contains(&self.discount_value) {
                    return Err(CouponError::PercentageOutOfRange(self.discount_value));
                }

                let max_discount = self
                    .max_discount_amount
                    .map(|max| non_negative(max).map(|max| Money::from_minor(max, currency)))
                    .transpose()?;

                DiscountRule::Percentage {
                    percent: Percentage::from(Decimal::new(self.discount_value, 2)),
                    max_discount,
                }
            }
            "fixed" => DiscountRule::Fixed {
                amount: Money::from_minor(non_negative(self.discount_value)?, currency),
            },
            other => return Err(CouponError::UnknownDiscountType(other.to_string())),
        };

        Ok(Coupon {
            id: self.id,
            name: self.name,
            rule,
        })
    }
}

fn non_negative(value: i64) -> Result<i64, CouponError> {
    if value < 0 {
        Err(CouponError::NegativeAmount(value))
    } else {
        Ok(value)
    }
}
