//! Cart cache

use std::sync::{Arc, PoisonError, RwLock};

use rustc_hash::FxHashMap;

use crate::{items::LineItem, uuids::UserUuid};

/// Key of a cart in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartKey {
    /// The single cart of an unauthenticated session.
    Guest,

    /// The cart of an authenticated user.
    User(UserUuid),
}

/// Shared, immutable cart contents. Replaced wholesale, never edited in place.
pub type CartItems = Arc<[LineItem<'static>]>;

/// Synchronous keyed store of cart contents, read by the UI.
pub trait CartCache: Send + Sync {
    /// Replaces the cached items for `key`.
    fn set_items(&self, key: CartKey, items: CartItems);

    /// Returns the cached items for `key`, if any.
    fn items(&self, key: CartKey) -> Option<CartItems>;
}

/// In-process [`CartCache`].
#[derive(Debug, Default)]
pub struct MemoryCartCache {
    entries: RwLock<FxHashMap<CartKey, CartItems>>,
}

impl MemoryCartCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CartCache for MemoryCartCache {
    fn set_items(&self, key: CartKey, items: CartItems) {
        // Entries are whole values, so a poisoned lock still holds a consistent map.
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, items);
    }

    fn items(&self, key: CartKey) -> Option<CartItems> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }
}
