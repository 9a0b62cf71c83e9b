//! Fixtures

use std::{fs, num::NonZeroU32, path::PathBuf};

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use thiserror::Error;

use crate::{
    coupons::{Coupon, CouponError, CouponRecord},
    fixtures::{
        carts::{CartAction, CartFixture, CartScript, SessionFixture, StepFixture},
        coupons::CouponsFixture,
        products::ProductsFixture,
    },
    products::{OptionId, Product},
    reforms::{Measurement, ReformData, TieId, TieItem},
    sync::Session,
    uuids::UserUuid,
};

pub mod carts;
pub mod coupons;
pub mod products;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Invalid measurement
    #[error("Invalid measurement: {0}")]
    InvalidMeasurement(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Currency mismatch between fixtures
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// No products loaded yet
    #[error("No products loaded yet; currency unknown")]
    NoCurrency,

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product key defined twice
    #[error("Duplicate product key: {0}")]
    DuplicateProduct(String),

    /// Option not offered by the product
    #[error("Product {product} has no option {option}")]
    OptionNotFound {
        /// Product key
        product: String,

        /// Requested option
        option: OptionId,
    },

    /// Coupon not found
    #[error("Coupon not found: {0}")]
    CouponNotFound(String),

    /// Invalid coupon definition
    #[error(transparent)]
    Coupon(#[from] CouponError),

    /// Adds need at least one unit
    #[error("Quantity must be at least 1 in step {0}")]
    InvalidQuantity(usize),
}

/// Fixture
#[derive(Debug)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Products in catalog order
    products: Vec<Product<'static>>,

    /// Product key -> index into `products`
    product_keys: FxHashMap<String, usize>,

    /// Coupons by key
    coupons: FxHashMap<String, Coupon<'static>>,

    /// Currency for the fixture set
    currency: Option<&'static Currency>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            products: Vec::new(),
            product_keys: FxHashMap::default(),
            coupons: FxHashMap::default(),
            currency: None,
        }
    }

    /// Load products and coupons sharing the same fixture name
    ///
    /// # Errors
    ///
    /// Returns an error if either fixture cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        Self::from_set_in("./fixtures", name)
    }

    /// Load products and coupons sharing the same fixture name from `base_path`
    ///
    /// # Errors
    ///
    /// Returns an error if either fixture cannot be loaded.
    pub fn from_set_in(base_path: impl Into<PathBuf>, name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::with_base_path(base_path);

        fixture.load_products(name)?.load_coupons(name)?;

        Ok(fixture)
    }

    /// Load products from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, if a key repeats, or if there are
    /// currency mismatches.
    pub fn load_products(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let contents = self.read("products", name)?;
        let fixture: ProductsFixture = serde_norway::from_str(&contents)?;

        for product_fixture in fixture.products {
            let key = product_fixture.key.clone();

            if self.product_keys.contains_key(&key) {
                return Err(FixtureError::DuplicateProduct(key));
            }

            let product = Product::try_from(product_fixture)?;

            self.check_currency(product.price.currency())?;
            self.product_keys.insert(key, self.products.len());
            self.products.push(product);
        }

        Ok(self)
    }

    /// Load coupons from a YAML fixture file, priced in the products' currency
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, if no products were loaded first,
    /// or if a coupon definition is invalid.
    pub fn load_coupons(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let currency = self.currency()?;
        let contents = self.read("coupons", name)?;
        let fixture: CouponsFixture = serde_norway::from_str(&contents)?;

        for coupon_fixture in fixture.coupons {
            let key = coupon_fixture.key.clone();
            let coupon = CouponRecord::from(coupon_fixture).into_coupon(currency)?;

            self.coupons.insert(key, coupon);
        }

        Ok(self)
    }

    /// Load and resolve a cart script against the loaded products and coupons
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a step refers to an unknown
    /// product, option or coupon.
    pub fn load_cart(&self, name: &str) -> Result<CartScript, FixtureError> {
        let contents = self.read("carts", name)?;
        let fixture: CartFixture = serde_norway::from_str(&contents)?;

        let session = match fixture.session {
            SessionFixture::Guest => Session::Guest,
            SessionFixture::User => Session::Authenticated(UserUuid::now_v7()),
        };

        let actions = fixture
            .steps
            .into_iter()
            .enumerate()
            .map(|(step, fixture)| self.resolve_step(step, fixture))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CartScript { session, actions })
    }

    /// Products in catalog order
    pub fn catalog(&self) -> &[Product<'static>] {
        &self.products
    }

    /// Get a product by key
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::ProductNotFound`] for unknown keys.
    pub fn product(&self, key: &str) -> Result<&Product<'static>, FixtureError> {
        self.product_keys
            .get(key)
            .and_then(|&idx| self.products.get(idx))
            .ok_or_else(|| FixtureError::ProductNotFound(key.to_string()))
    }

    /// Get a coupon by key
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::CouponNotFound`] for unknown keys.
    pub fn coupon(&self, key: &str) -> Result<&Coupon<'static>, FixtureError> {
        self.coupons
            .get(key)
            .ok_or_else(|| FixtureError::CouponNotFound(key.to_string()))
    }

    /// Currency of the loaded products
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::NoCurrency`] if no products have been loaded.
    pub fn currency(&self) -> Result<&'static Currency, FixtureError> {
        self.currency.ok_or(FixtureError::NoCurrency)
    }

    fn read(&self, kind: &str, name: &str) -> Result<String, FixtureError> {
        let file_path = self.base_path.join(kind).join(format!("{name}.yml"));

        Ok(fs::read_to_string(file_path)?)
    }

    fn check_currency(&mut self, currency: &'static Currency) -> Result<(), FixtureError> {
        match self.currency {
            Some(existing) if existing != currency => Err(FixtureError::CurrencyMismatch(
                existing.iso_alpha_code.to_string(),
                currency.iso_alpha_code.to_string(),
            )),
            Some(_) => Ok(()),
            None => {
                self.currency = Some(currency);

                Ok(())
            }
        }
    }

    fn resolve_step(&self, step: usize, fixture: StepFixture) -> Result<CartAction, FixtureError> {
        let quantity = |n: u32| NonZeroU32::new(n).ok_or(FixtureError::InvalidQuantity(step));

        Ok(match fixture {
            StepFixture::AddProduct {
                product: key,
                option,
                quantity: n,
            } => {
                let product = self.product(&key)?;

                let option = option
                    .map(|id| {
                        product
                            .option(OptionId(id))
                            .cloned()
                            .ok_or(FixtureError::OptionNotFound {
                                product: key.clone(),
                                option: OptionId(id),
                            })
                    })
                    .transpose()?;

                CartAction::AddProduct {
                    product: product.clone(),
                    option,
                    quantity: quantity(n)?,
                }
            }
            StepFixture::AddReform {
                tie,
                length,
                height,
                cost,
                quantity: n,
            } => {
                let cost = products::parse_money(&cost)?;
                self.expect_currency(cost.currency())?;

                CartAction::AddReform {
                    reform: ReformData {
                        tie: TieItem {
                            id: TieId(tie),
                            measurement: parse_measurement(length.as_deref(), height.as_deref())?,
                            image: None,
                            notes: None,
                        },
                        cost,
                    },
                    quantity: quantity(n)?,
                }
            }
            StepFixture::UpdateQuantity { line, quantity } => {
                CartAction::UpdateQuantity { line, quantity }
            }
            StepFixture::Remove { line } => CartAction::Remove { line },
            StepFixture::ApplyCoupon { line, coupon } => CartAction::ApplyCoupon {
                line,
                coupon: coupon.map(|key| self.coupon(&key).cloned()).transpose()?,
            },
            StepFixture::FailNextWrite => CartAction::FailNextWrite,
        })
    }

    fn expect_currency(&self, currency: &'static Currency) -> Result<(), FixtureError> {
        let expected = self.currency()?;

        if expected == currency {
            Ok(())
        } else {
            Err(FixtureError::CurrencyMismatch(
                expected.iso_alpha_code.to_string(),
                currency.iso_alpha_code.to_string(),
            ))
        }
    }
}

/// Exactly one of `length` or `height` must be given.
fn parse_measurement(
    length: Option<&str>,
    height: Option<&str>,
) -> Result<Measurement, FixtureError> {
    let parse = |value: &str| {
        value
            .trim()
            .parse::<Decimal>()
            .ok()
            .filter(|cm| cm.is_sign_positive() && !cm.is_zero())
            .ok_or_else(|| FixtureError::InvalidMeasurement(value.to_string()))
    };

    match (length, height) {
        (Some(length), None) => Ok(Measurement::Length(parse(length)?)),
        (None, Some(height)) => Ok(Measurement::Height(parse(height)?)),
        _ => Err(FixtureError::InvalidMeasurement(
            "expected exactly one of length or height".to_string(),
        )),
    }
}
