//! Typed Uuids

use std::{
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    marker::PhantomData,
};

use uuid::Uuid;

/// A [`Uuid`] tagged with the entity it identifies, so user, coupon and
/// issuance identifiers cannot be swapped by accident.
///
/// Comparison and hashing only look at the uuid; the markers are uninhabited.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypedUuid<T>(Uuid, PhantomData<T>);

impl<T> TypedUuid<T> {
    /// Generates a new time-ordered (v7) uuid.
    #[must_use]
    pub fn now_v7() -> Self {
        Self(Uuid::now_v7(), PhantomData)
    }

    /// The raw uuid, for storage keys and wire formats.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl<T> Debug for TypedUuid<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Debug::fmt(&self.0, f)
    }
}

impl<T> Display for TypedUuid<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

impl<T> From<Uuid> for TypedUuid<T> {
    fn from(value: Uuid) -> Self {
        Self(value, PhantomData)
    }
}

/// Marker for authenticated storefront users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum User {}

/// Marker for coupon definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CouponMarker {}

/// Marker for per-user coupon issuances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Issuance {}

/// Identifier of an authenticated user; remote carts are keyed by it.
pub type UserUuid = TypedUuid<User>;

/// Identifier of a coupon definition.
pub type CouponUuid = TypedUuid<CouponMarker>;

/// Identifier of a coupon issued to a user.
pub type IssuanceUuid = TypedUuid<Issuance>;
