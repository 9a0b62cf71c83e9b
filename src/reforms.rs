//! Reforms
//!
//! A reform is a custom alteration of a customer's own tie, configured by measurement rather than
//! picked from catalog stock.

use std::fmt;

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};

/// Identifier of a tie submitted for reform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TieId(pub String);

impl fmt::Display for TieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the alteration is specified, in centimetres.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measurement {
    /// Target tie length.
    Length(Decimal),

    /// Wearer height; the tailor derives the length.
    Height(Decimal),
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measurement::Length(cm) => write!(f, "length {cm}cm"),
            Measurement::Height(cm) => write!(f, "height {cm}cm"),
        }
    }
}

/// A tie submitted for reform.
#[derive(Debug, Clone, PartialEq)]
pub struct TieItem {
    /// Tie identifier
    pub id: TieId,

    /// Requested measurement
    pub measurement: Measurement,

    /// Uploaded photo reference
    pub image: Option<String>,

    /// Free-form instructions for the tailor
    pub notes: Option<String>,
}

/// Reform payload embedded in a reform line item.
#[derive(Debug, Clone, PartialEq)]
pub struct ReformData<'a> {
    /// The tie being altered
    pub tie: TieItem,

    /// Price of the alteration, computed when the reform was configured
    pub cost: Money<'a, Currency>,
}
