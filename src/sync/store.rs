//! Cart stores
//!
//! Durable homes for cart contents: client-local storage for guests and the remote backend for
//! authenticated users. Both are asynchronous and may fail.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

use crate::{
    items::LineItem,
    sync::cache::{CartItems, CartKey},
};

/// Errors raised by a cart store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("cart store unavailable: {0}")]
    Unavailable(String),

    /// The store refused the write.
    #[error("cart store rejected the write: {0}")]
    Rejected(String),
}

/// Backing store for one kind of cart.
#[automock]
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Replaces the stored items for `key`.
    async fn write_items(&self, key: CartKey, items: &[LineItem<'static>]) -> Result<(), StoreError>;

    /// Reads the stored items for `key`; a missing cart reads as empty.
    async fn read_items(&self, key: CartKey) -> Result<Vec<LineItem<'static>>, StoreError>;
}

/// The two stores a cart can live in.
#[derive(Clone)]
pub struct CartStores {
    /// Store for unauthenticated sessions
    pub guest: Arc<dyn CartStore>,

    /// Store for authenticated users
    pub remote: Arc<dyn CartStore>,
}

impl std::fmt::Debug for CartStores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStores").finish_non_exhaustive()
    }
}

/// In-process [`CartStore`], used as the guest store and in tests.
#[derive(Debug, Default)]
pub struct MemoryCartStore {
    carts: Mutex<rustc_hash::FxHashMap<CartKey, CartItems>>,
}

impl MemoryCartStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for MemoryCartStore {
    async fn write_items(&self, key: CartKey, items: &[LineItem<'static>]) -> Result<(), StoreError> {
        self.carts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::from(items));

        Ok(())
    }

    async fn read_items(&self, key: CartKey) -> Result<Vec<LineItem<'static>>, StoreError> {
        Ok(self
            .carts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .map(|items| items.to_vec())
            .unwrap_or_default())
    }
}
