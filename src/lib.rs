//! Storefront Cart
//!
//! Shopping cart engine for a tie storefront: pure cart mutations, coupon pricing, attribute-based
//! recommendations and an optimistic cache/store synchronizer with rollback.

pub mod cart;
pub mod config;
pub mod controller;
pub mod coupons;
pub mod discounts;
pub mod fixtures;
pub mod items;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod receipt;
pub mod recommendations;
pub mod reforms;
pub mod sync;
pub mod uuids;
