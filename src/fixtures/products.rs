//! Product Fixtures

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{
    Money,
    iso::{Currency, EUR, GBP, KRW, USD},
};
use serde::Deserialize;
use smallvec::SmallVec;

use crate::{
    fixtures::FixtureError,
    products::{OptionId, Product, ProductId, ProductOption},
};

/// Wrapper for products in YAML, in catalog order
#[derive(Debug, Deserialize)]
pub struct ProductsFixture {
    /// Catalog entries
    pub products: Vec<ProductFixture>,
}

/// Product Fixture
#[derive(Debug, Deserialize)]
pub struct ProductFixture {
    /// Key used by other fixtures to refer to this product
    pub key: String,

    /// Product identifier
    pub id: u64,

    /// Merchant product code
    pub code: String,

    /// Product name
    pub name: String,

    /// Product price (e.g., "39000 KRW")
    pub price: String,

    /// Category
    #[serde(default)]
    pub category: Option<String>,

    /// Color
    #[serde(default)]
    pub color: Option<String>,

    /// Pattern
    #[serde(default)]
    pub pattern: Option<String>,

    /// Material
    #[serde(default)]
    pub material: Option<String>,

    /// Units in stock
    #[serde(default)]
    pub stock: u32,

    /// Purchasable options
    #[serde(default)]
    pub options: Vec<OptionFixture>,
}

/// Product option fixture
#[derive(Debug, Deserialize)]
pub struct OptionFixture {
    /// Option identifier
    pub id: u64,

    /// Option name
    pub name: String,

    /// Additional price (e.g., "3000 KRW")
    pub price: String,
}

impl TryFrom<ProductFixture> for Product<'_> {
    type Error = FixtureError;

    fn try_from(fixture: ProductFixture) -> Result<Self, Self::Error> {
        let price = parse_money(&fixture.price)?;

        let options = fixture
            .options
            .into_iter()
            .map(|option| {
                let additional_price = parse_money(&option.price)?;

                if additional_price.currency() != price.currency() {
                    return Err(FixtureError::CurrencyMismatch(
                        price.currency().iso_alpha_code.to_string(),
                        additional_price.currency().iso_alpha_code.to_string(),
                    ));
                }

                Ok(ProductOption {
                    id: OptionId(option.id),
                    name: option.name,
                    additional_price,
                })
            })
            .collect::<Result<SmallVec<_>, _>>()?;

        Ok(Product {
            id: ProductId(fixture.id),
            code: fixture.code,
            name: fixture.name,
            price,
            category: fixture.category,
            color: fixture.color,
            pattern: fixture.pattern,
            material: fixture.material,
            stock: fixture.stock,
            options,
        })
    }
}

/// Parse a price string (e.g., "39000 KRW" or "2.99 GBP") into money.
///
/// # Errors
///
/// Returns an error under the same conditions as [`parse_price`].
pub fn parse_money(s: &str) -> Result<Money<'static, Currency>, FixtureError> {
    let (minor_units, currency) = parse_price(s)?;

    Ok(Money::from_minor(minor_units, currency))
}

/// Parse a price string (e.g., "2.99 GBP") into minor units and currency.
///
/// The amount is scaled by the currency's exponent, so "39000 KRW" is 39000 minor units and
/// "2.99 GBP" is 299.
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY", if the amount is not a
/// decimal with at most the currency's number of fraction digits, or if the currency code is not
/// recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), FixtureError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    let [amount, currency_code] = parts.as_slice() else {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let currency = parse_currency(currency_code)?;

    let scaled = amount
        .checked_mul(Decimal::from(10_i64.pow(currency.exponent)))
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    if scaled.fract() != Decimal::ZERO {
        return Err(FixtureError::InvalidPrice(format!(
            "{s} has more fraction digits than {} allows",
            currency.iso_alpha_code
        )));
    }

    let minor_units = scaled
        .to_i64()
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    Ok((minor_units, currency))
}

/// Look up a supported ISO currency code.
///
/// # Errors
///
/// Returns [`FixtureError::UnknownCurrency`] for any other code.
pub fn parse_currency(code: &str) -> Result<&'static Currency, FixtureError> {
    match code {
        "KRW" => Ok(KRW),
        "GBP" => Ok(GBP),
        "USD" => Ok(USD),
        "EUR" => Ok(EUR),
        other => Err(FixtureError::UnknownCurrency(other.to_string())),
    }
}
