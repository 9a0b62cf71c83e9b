//! Coupon Fixtures

use serde::Deserialize;

use crate::{coupons::CouponRecord, uuids::CouponUuid};

/// Wrapper for coupons in YAML
#[derive(Debug, Deserialize)]
pub struct CouponsFixture {
    /// Coupon definitions
    pub coupons: Vec<CouponFixture>,
}

/// Coupon Fixture, amounts in minor units
#[derive(Debug, Deserialize)]
pub struct CouponFixture {
    /// Key used by cart scripts to refer to this coupon
    pub key: String,

    /// Display name
    pub name: String,

    /// `percentage` or `fixed`
    pub discount_type: String,

    /// Percent points, or a fixed amount in minor units
    pub discount_value: i64,

    /// Cap for percentage coupons
    #[serde(default)]
    pub max_discount_amount: Option<i64>,
}

impl From<CouponFixture> for CouponRecord {
    fn from(fixture: CouponFixture) -> Self {
        CouponRecord {
            id: CouponUuid::now_v7(),
            name: fixture.name,
            discount_type: fixture.discount_type,
            discount_value: fixture.discount_value,
            max_discount_amount: fixture.max_discount_amount,
        }
    }
}
