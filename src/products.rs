//! Products

use std::fmt;

use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;

/// Catalog product identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductId(pub u64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Product option identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OptionId(pub u64);

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A purchasable variation of a product (e.g. gift wrapping), priced on top of the base price.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductOption<'a> {
    /// Option identifier
    pub id: OptionId,

    /// Display name
    pub name: String,

    /// Price added to the product price when this option is chosen
    pub additional_price: Money<'a, Currency>,
}

/// Catalog product.
///
/// Owned by the catalog; the cart keeps its own clone alongside the chosen option.
#[derive(Debug, Clone, PartialEq)]
pub struct Product<'a> {
    /// Product identifier
    pub id: ProductId,

    /// Merchant product code
    pub code: String,

    /// Product name
    pub name: String,

    /// Product price
    pub price: Money<'a, Currency>,

    /// Category, if classified
    pub category: Option<String>,

    /// Dominant color
    pub color: Option<String>,

    /// Pattern (stripe, dot, solid, ...)
    pub pattern: Option<String>,

    /// Fabric
    pub material: Option<String>,

    /// Units in stock
    pub stock: u32,

    /// Purchasable options
    pub options: SmallVec<[ProductOption<'a>; 4]>,
}

impl<'a> Product<'a> {
    /// Creates a product with no attributes, no stock and no options.
    pub fn new(
        id: ProductId,
        code: impl Into<String>,
        name: impl Into<String>,
        price: Money<'a, Currency>,
    ) -> Self {
        Self {
            id,
            code: code.into(),
            name: name.into(),
            price,
            category: None,
            color: None,
            pattern: None,
            material: None,
            stock: 0,
            options: SmallVec::new(),
        }
    }

    /// Looks up one of this product's options.
    pub fn option(&self, id: OptionId) -> Option<&ProductOption<'a>> {
        self.options.iter().find(|option| option.id == id)
    }

    /// Returns the `(category, color, pattern, material)` attributes.
    pub fn attributes(&self) -> ProductAttributes<'_> {
        ProductAttributes {
            category: self.category.as_deref(),
            color: self.color.as_deref(),
            pattern: self.pattern.as_deref(),
            material: self.material.as_deref(),
        }
    }
}

/// Borrowed view of the attributes used for similarity matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProductAttributes<'p> {
    /// Category
    pub category: Option<&'p str>,

    /// Color
    pub color: Option<&'p str>,

    /// Pattern
    pub pattern: Option<&'p str>,

    /// Material
    pub material: Option<&'p str>,
}
