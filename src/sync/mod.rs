//! Cart synchronization
//!
//! Commits a new cart list to the cache and to the session's backing store. The cache is written
//! optimistically; if the store write fails, both are put back to the previous list.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::uuids::UserUuid;

pub mod cache;
pub mod store;

pub use cache::{CartCache, CartItems, CartKey, MemoryCartCache};
pub use store::{CartStore, CartStores, MemoryCartStore, MockCartStore, StoreError};

/// Who the cart belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Session {
    /// Unauthenticated visitor; the cart lives in the guest store.
    Guest,

    /// Signed-in user; the cart lives in the remote store.
    Authenticated(UserUuid),
}

impl Session {
    /// Cache key of this session's cart.
    pub fn cart_key(&self) -> CartKey {
        match self {
            Session::Guest => CartKey::Guest,
            Session::Authenticated(user) => CartKey::User(*user),
        }
    }

    /// Whether the session is signed in.
    pub fn is_logged_in(&self) -> bool {
        match self {
            Session::Guest => false,
            Session::Authenticated(_) => true,
        }
    }
}

impl CartStores {
    /// The store holding this session's cart.
    pub fn for_session(&self, session: &Session) -> &Arc<dyn CartStore> {
        match session {
            Session::Guest => &self.guest,
            Session::Authenticated(_) => &self.remote,
        }
    }
}

/// Errors returned by [`sync_cart_items_with_rollback`].
#[derive(Debug, Error)]
pub enum SyncError {
    /// The store write failed; cache and store were restored to the previous items.
    #[error("cart write failed; previous items restored")]
    WriteFailed(#[source] StoreError),

    /// The store write failed and so did the compensating write. The cache holds the previous
    /// items but the store's contents are unknown.
    #[error("cart write failed and restoring previous items also failed: {rollback}")]
    RollbackFailed {
        /// The original write failure
        #[source]
        cause: StoreError,

        /// The compensating write failure
        rollback: StoreError,
    },
}

impl SyncError {
    /// The original write failure.
    pub fn cause(&self) -> &StoreError {
        match self {
            SyncError::WriteFailed(cause) | SyncError::RollbackFailed { cause, .. } => cause,
        }
    }

    /// Whether the cart must be reloaded from its store before the cache can be trusted.
    pub fn requires_reload(&self) -> bool {
        match self {
            SyncError::WriteFailed(_) => false,
            SyncError::RollbackFailed { .. } => true,
        }
    }
}

/// A cart transition to commit.
#[derive(Debug, Clone)]
pub struct SyncRequest<'r> {
    /// Whose cart is being written
    pub session: Session,

    /// The list to commit
    pub next_items: CartItems,

    /// The list to restore on failure
    pub previous_items: CartItems,

    /// Message handed to the error callback on failure
    pub error_message: &'r str,
}

/// Writes `next_items` to the cache and the session's store, rolling both back on failure.
///
/// Calls are not serialized. When two syncs race on the same cart, the cache holds the list set
/// last and the store holds the write that completed last, so the two can diverge; a late
/// failure rolls both back over an earlier success. Sequence them in the caller.
///
/// # Errors
///
/// - [`SyncError::WriteFailed`]: the store write failed and the previous items were restored.
/// - [`SyncError::RollbackFailed`]: the store write failed and so did restoring the store.
///
/// `on_error` is called with the request's error message exactly once in both cases, and never
/// on success.
#[tracing::instrument(
    name = "cart.sync.sync_cart_items_with_rollback",
    skip(cache, stores, request, on_error),
    fields(
        cart = ?request.session.cart_key(),
        logged_in = request.session.is_logged_in(),
        next_len = request.next_items.len(),
        previous_len = request.previous_items.len()
    ),
    err
)]
pub async fn sync_cart_items_with_rollback<F>(
    cache: &dyn CartCache,
    stores: &CartStores,
    request: SyncRequest<'_>,
    on_error: F,
) -> Result<(), SyncError>
where
    F: FnOnce(&str) + Send,
{
    let key = request.session.cart_key();
    let store = stores.for_session(&request.session);

    cache.set_items(key, Arc::clone(&request.next_items));

    let Err(cause) = store.write_items(key, &request.next_items).await else {
        debug!("cart write committed");

        return Ok(());
    };

    warn!(error = %cause, "cart write failed, restoring previous items");

    cache.set_items(key, Arc::clone(&request.previous_items));

    let rollback = store.write_items(key, &request.previous_items).await;

    on_error(request.error_message);

    match rollback {
        Ok(()) => Err(SyncError::WriteFailed(cause)),
        Err(rollback) => {
            error!(error = %rollback, "restoring previous cart items failed");

            Err(SyncError::RollbackFailed { cause, rollback })
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::items::{LineItem, test_support::*};

    use super::*;

    fn items(list: Vec<LineItem<'static>>) -> CartItems {
        Arc::from(list)
    }

    fn stores(guest: impl CartStore + 'static, remote: impl CartStore + 'static) -> CartStores {
        CartStores {
            guest: Arc::new(guest),
            remote: Arc::new(remote),
        }
    }

    #[tokio::test]
    async fn successful_guest_write_updates_cache_and_guest_store() -> TestResult {
        let cache = MemoryCartCache::new();
        let guest = Arc::new(MemoryCartStore::new());

        let mut remote = MockCartStore::new();
        remote.expect_write_items().never();

        let stores = CartStores {
            guest: Arc::clone(&guest) as Arc<dyn CartStore>,
            remote: Arc::new(remote),
        };

        let next = items(vec![product_item("a", tie(1, 10_000), 1)]);
        let mut errors: Vec<String> = Vec::new();

        sync_cart_items_with_rollback(
            &cache,
            &stores,
            SyncRequest {
                session: Session::Guest,
                next_items: Arc::clone(&next),
                previous_items: items(vec![]),
                error_message: "could not add to cart",
            },
            |message: &str| errors.push(message.to_string()),
        )
        .await?;

        assert_eq!(cache.items(CartKey::Guest), Some(Arc::clone(&next)));
        assert_eq!(guest.read_items(CartKey::Guest).await?, next.to_vec());
        assert!(errors.is_empty(), "no error should be reported on success");

        Ok(())
    }

    #[tokio::test]
    async fn authenticated_session_writes_to_remote_store() -> TestResult {
        let cache = MemoryCartCache::new();
        let user = UserUuid::now_v7();

        let mut guest = MockCartStore::new();
        guest.expect_write_items().never();

        let mut remote = MockCartStore::new();
        remote
            .expect_write_items()
            .withf(move |key, items| *key == CartKey::User(user) && items.len() == 1)
            .times(1)
            .returning(|_, _| Ok(()));

        sync_cart_items_with_rollback(
            &cache,
            &stores(guest, remote),
            SyncRequest {
                session: Session::Authenticated(user),
                next_items: items(vec![reform_item("r", 15_000, 1)]),
                previous_items: items(vec![]),
                error_message: "could not add reform",
            },
            |_: &str| {},
        )
        .await?;

        assert_eq!(cache.items(CartKey::User(user)).map(|i| i.len()), Some(1));
        assert!(cache.items(CartKey::Guest).is_none());

        Ok(())
    }

    #[tokio::test]
    async fn failed_write_rolls_back_cache_and_store() {
        let cache = MemoryCartCache::new();
        let a = product_item("a", tie(1, 10_000), 1);
        let b = product_item("b", tie(2, 20_000), 1);

        let previous = items(vec![a.clone()]);
        let next = items(vec![a.clone(), b]);

        let mut guest = MockCartStore::new();
        let mut seq = mockall::Sequence::new();

        guest
            .expect_write_items()
            .withf(|_, items| items.len() == 2)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(StoreError::Unavailable("quota exceeded".to_string())));

        guest
            .expect_write_items()
            .withf(move |_, items| items == [a.clone()].as_slice())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let mut calls = Vec::new();

        let result = sync_cart_items_with_rollback(
            &cache,
            &stores(guest, MockCartStore::new()),
            SyncRequest {
                session: Session::Guest,
                next_items: next,
                previous_items: Arc::clone(&previous),
                error_message: "could not add to cart",
            },
            |message: &str| calls.push(message.to_string()),
        )
        .await;

        assert!(
            matches!(&result, Err(SyncError::WriteFailed(StoreError::Unavailable(_)))),
            "expected WriteFailed, got {result:?}"
        );
        assert_eq!(cache.items(CartKey::Guest), Some(previous));
        assert_eq!(calls, vec!["could not add to cart".to_string()]);
        assert!(result.is_err_and(|e| !e.requires_reload()));
    }

    #[tokio::test]
    async fn failed_rollback_is_reported_explicitly() {
        let cache = MemoryCartCache::new();
        let user = UserUuid::now_v7();
        let previous = items(vec![product_item("a", tie(1, 10_000), 1)]);

        let mut remote = MockCartStore::new();
        remote
            .expect_write_items()
            .times(2)
            .returning(|_, _| Err(StoreError::Rejected("offline".to_string())));

        let mut calls = 0;

        let result = sync_cart_items_with_rollback(
            &cache,
            &stores(MockCartStore::new(), remote),
            SyncRequest {
                session: Session::Authenticated(user),
                next_items: items(vec![]),
                previous_items: Arc::clone(&previous),
                error_message: "could not remove item",
            },
            |_: &str| calls += 1,
        )
        .await;

        let Err(error) = result else {
            panic!("expected the sync to fail");
        };

        assert!(error.requires_reload());
        assert_eq!(error.cause(), &StoreError::Rejected("offline".to_string()));
        assert_eq!(calls, 1);
        assert_eq!(cache.items(CartKey::User(user)), Some(previous));
    }

    #[test]
    fn session_selects_key_and_store() {
        let user = UserUuid::now_v7();

        assert_eq!(Session::Guest.cart_key(), CartKey::Guest);
        assert_eq!(Session::Authenticated(user).cart_key(), CartKey::User(user));
        assert!(!Session::Guest.is_logged_in());
        assert!(Session::Authenticated(user).is_logged_in());
    }
}
