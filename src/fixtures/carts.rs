//! Cart Script Fixtures
//!
//! A cart script is a session plus a list of steps to replay against a cart. Lines are referred to
//! by their position in the cart at the time the step runs, since line ids are generated.

use std::num::NonZeroU32;

use serde::Deserialize;

use crate::{
    coupons::Coupon,
    products::{Product, ProductOption},
    reforms::ReformData,
    sync::Session,
};

/// Wrapper for a cart script in YAML
#[derive(Debug, Deserialize)]
pub struct CartFixture {
    /// Who owns the cart
    #[serde(default)]
    pub session: SessionFixture,

    /// Steps to replay, in order
    pub steps: Vec<StepFixture>,
}

/// Session kind of a cart script
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionFixture {
    /// Unauthenticated visitor
    #[default]
    Guest,

    /// Signed-in user; a fresh user id is generated
    User,
}

/// A single cart script step
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepFixture {
    /// Add a catalog product
    AddProduct {
        /// Product key
        product: String,

        /// Option id, if any
        #[serde(default)]
        option: Option<u64>,

        /// Units to add
        #[serde(default = "one")]
        quantity: u32,
    },

    /// Add a tie reform
    AddReform {
        /// Tie identifier
        tie: String,

        /// Target length in cm, e.g. "145.5"
        #[serde(default)]
        length: Option<String>,

        /// Wearer height in cm
        #[serde(default)]
        height: Option<String>,

        /// Reform price (e.g., "15000 KRW")
        cost: String,

        /// Units to add
        #[serde(default = "one")]
        quantity: u32,
    },

    /// Change the quantity of a line
    UpdateQuantity {
        /// Line position
        line: usize,

        /// New quantity; zero is rejected by the cart
        quantity: u32,
    },

    /// Remove a line
    Remove {
        /// Line position
        line: usize,
    },

    /// Attach or clear a coupon on a line
    ApplyCoupon {
        /// Line position
        line: usize,

        /// Coupon key; absent clears the line's coupon
        #[serde(default)]
        coupon: Option<String>,
    },

    /// Make the next store write fail
    FailNextWrite,
}

fn one() -> u32 {
    1
}

/// A cart script with every reference resolved.
#[derive(Debug, Clone)]
pub struct CartScript {
    /// Who owns the cart
    pub session: Session,

    /// Actions to replay, in order
    pub actions: Vec<CartAction>,
}

/// A resolved cart script step.
#[derive(Debug, Clone)]
pub enum CartAction {
    /// Add a catalog product
    AddProduct {
        /// Product to add
        product: Product<'static>,

        /// Chosen option
        option: Option<ProductOption<'static>>,

        /// Units to add
        quantity: NonZeroU32,
    },

    /// Add a tie reform
    AddReform {
        /// Reform payload
        reform: ReformData<'static>,

        /// Units to add
        quantity: NonZeroU32,
    },

    /// Change the quantity of the line at `line`
    UpdateQuantity {
        /// Line position
        line: usize,

        /// New quantity
        quantity: u32,
    },

    /// Remove the line at `line`
    Remove {
        /// Line position
        line: usize,
    },

    /// Attach or clear a coupon on the line at `line`
    ApplyCoupon {
        /// Line position
        line: usize,

        /// Coupon to attach
        coupon: Option<Coupon<'static>>,
    },

    /// Make the next store write fail
    FailNextWrite,
}
