//! Discounts
//!
//! Arithmetic shared by coupon rules. Discounts are exact decimal amounts and are never rounded
//! here; rounding happens only when an amount is formatted.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

/// Errors specific to discount calculations.
#[derive(Debug, Error)]
pub enum DiscountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// A discount amount was in a different currency to the price it applies to.
    #[error("discount is in {0}, but the price is in {1}")]
    CurrencyMismatch(&'static str, &'static str),

    /// Wrapped money arithmetic error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Calculate `percent` of `amount` without rounding.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if the calculation overflows.
pub fn percent_of(percent: &Percentage, amount: Decimal) -> Result<Decimal, DiscountError> {
    ((*percent) * Decimal::ONE) // decimal_percentage doesn't expose the underlying Decimal
        .checked_mul(amount)
        .ok_or(DiscountError::PercentConversion)
}

/// Percentage of a price, optionally capped at `max`, never below zero.
///
/// # Errors
///
/// - [`DiscountError::PercentConversion`]: the percentage could not be applied.
/// - [`DiscountError::CurrencyMismatch`]: `max` is in a different currency to `price`.
pub fn percentage_off<'a>(
    price: &Money<'a, Currency>,
    percent: &Percentage,
    max: Option<&Money<'a, Currency>>,
) -> Result<Money<'a, Currency>, DiscountError> {
    let discount = percent_of(percent, *price.amount())?;

    let capped = match max {
        Some(max) => {
            ensure_same_currency(max, price)?;
            discount.min(*max.amount())
        }
        None => discount,
    };

    Ok(Money::from_decimal(capped.max(Decimal::ZERO), price.currency()))
}

/// Fixed amount off a price; never more than the price itself and never below zero.
///
/// # Errors
///
/// Returns [`DiscountError::CurrencyMismatch`] if `amount` and `price` differ in currency.
pub fn amount_off<'a>(
    price: &Money<'a, Currency>,
    amount: &Money<'a, Currency>,
) -> Result<Money<'a, Currency>, DiscountError> {
    ensure_same_currency(amount, price)?;

    let discount = amount.amount().min(price.amount()).max(&Decimal::ZERO);

    Ok(Money::from_decimal(*discount, price.currency()))
}

fn ensure_same_currency(
    amount: &Money<'_, Currency>,
    price: &Money<'_, Currency>,
) -> Result<(), DiscountError> {
    if amount.currency() == price.currency() {
        Ok(())
    } else {
        Err(DiscountError::CurrencyMismatch(
            amount.currency().iso_alpha_code,
            price.currency().iso_alpha_code,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::convert::TryFrom;

    use rusty_money::iso::{KRW, USD};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn percent_of_overflow_returns_error() -> TestResult {
        let percent = Percentage::try_from("100000000000000000000")?;
        let result = percent_of(&percent, Decimal::MAX);

        assert!(matches!(result, Err(DiscountError::PercentConversion)));

        Ok(())
    }

    #[test]
    fn percent_of_keeps_fractional_minor_units() -> TestResult {
        let percent = Percentage::from(Decimal::new(10, 2));

        assert_eq!(percent_of(&percent, Decimal::from(15))?, Decimal::new(15, 1));
        assert_eq!(percent_of(&percent, Decimal::from(200))?, Decimal::from(20));

        Ok(())
    }

    #[test]
    fn percentage_off_does_not_round() -> TestResult {
        let price = Money::from_minor(15, KRW);

        let discount = percentage_off(&price, &Percentage::from(Decimal::new(10, 2)), None)?;

        assert_eq!(*discount.amount(), Decimal::new(15, 1));

        Ok(())
    }

    #[test]
    fn negative_percentage_gives_no_discount() -> TestResult {
        let price = Money::from_minor(10_000, KRW);

        let discount = percentage_off(&price, &Percentage::from(Decimal::new(-20, 2)), None)?;

        assert!(discount.is_zero());

        Ok(())
    }

    #[test]
    fn percentage_off_is_clamped_to_max() -> TestResult {
        let price = Money::from_minor(10_000, KRW);
        let max = Money::from_minor(2_000, KRW);

        let discount = percentage_off(&price, &Percentage::from(0.5), Some(&max))?;

        assert_eq!(discount, Money::from_minor(2_000, KRW));

        Ok(())
    }

    #[test]
    fn percentage_off_below_max_is_unchanged() -> TestResult {
        let price = Money::from_minor(10_000, KRW);
        let max = Money::from_minor(5_000, KRW);

        let discount = percentage_off(&price, &Percentage::from(0.1), Some(&max))?;

        assert_eq!(discount, Money::from_minor(1_000, KRW));

        Ok(())
    }

    #[test]
    fn percentage_off_rejects_cap_in_other_currency() {
        let price = Money::from_minor(10_000, KRW);
        let max = Money::from_minor(2_000, USD);

        let result = percentage_off(&price, &Percentage::from(0.5), Some(&max));

        assert!(matches!(result, Err(DiscountError::CurrencyMismatch("USD", "KRW"))));
    }

    #[test]
    fn amount_off_never_exceeds_price() -> TestResult {
        let price = Money::from_minor(500, KRW);
        let amount = Money::from_minor(15_000, KRW);

        assert_eq!(amount_off(&price, &amount)?, Money::from_minor(500, KRW));

        Ok(())
    }

    #[test]
    fn amount_off_below_price_is_the_amount() -> TestResult {
        let price = Money::from_minor(20_000, KRW);
        let amount = Money::from_minor(5_000, KRW);

        assert_eq!(amount_off(&price, &amount)?, Money::from_minor(5_000, KRW));

        Ok(())
    }

    #[test]
    fn negative_amount_never_raises_the_price() -> TestResult {
        let price = Money::from_minor(20_000, KRW);
        let amount = Money::from_minor(-5_000, KRW);

        assert!(amount_off(&price, &amount)?.is_zero());

        Ok(())
    }
}
