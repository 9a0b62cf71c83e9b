//! Cart controller
//!
//! Runs cart mutations against the cached list and commits the result through the synchronizer,
//! one operation at a time.

use std::{
    borrow::Cow,
    fmt,
    num::NonZeroU32,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use rusty_money::iso::Currency;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    cart::{
        add_product_to_cart, add_reform_to_cart, apply_cart_item_coupon, remove_cart_item,
        update_cart_item_quantity,
    },
    coupons::AppliedCoupon,
    items::{IdGenerator, LineItem, LineItemId, UuidIdGenerator},
    pricing::{OrderSummary, PricingError, calculate_order_summary},
    products::{Product, ProductOption},
    recommendations::recommended_products,
    reforms::ReformData,
    sync::{
        CartCache, CartItems, CartStores, Session, StoreError, SyncError, SyncRequest,
        sync_cart_items_with_rollback,
    },
};

const ADD_FAILED: &str = "Could not add the item to your cart. Please try again.";
const REMOVE_FAILED: &str = "Could not remove the item from your cart. Please try again.";
const QUANTITY_FAILED: &str = "Could not change the quantity. Please try again.";
const COUPON_FAILED: &str = "Could not apply the coupon. Please try again.";

/// Errors returned by [`CartController`] operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Another operation on this cart has not settled yet.
    #[error("a cart update is already in progress")]
    SyncInFlight,

    /// The cart could not be committed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// The cart could not be loaded.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Receives the user-facing message of a failed cart operation.
pub trait ErrorReporter: Send + Sync {
    /// Shows `message` to the user.
    fn report(&self, message: &str);
}

impl<F> ErrorReporter for F
where
    F: Fn(&str) + Send + Sync,
{
    fn report(&self, message: &str) {
        self(message);
    }
}

/// Cart operations for one session.
pub struct CartController<G = UuidIdGenerator> {
    session: Session,
    cache: Arc<dyn CartCache>,
    stores: CartStores,
    ids: G,
    reporter: Arc<dyn ErrorReporter>,
    in_flight: AtomicBool,
}

impl<G> fmt::Debug for CartController<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartController")
            .field("session", &self.session)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

impl<G: IdGenerator + Send + Sync> CartController<G> {
    /// Creates a controller for `session`.
    pub fn new(
        session: Session,
        cache: Arc<dyn CartCache>,
        stores: CartStores,
        ids: G,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            session,
            cache,
            stores,
            ids,
            reporter,
            in_flight: AtomicBool::new(false),
        }
    }

    /// The session this controller serves.
    pub fn session(&self) -> Session {
        self.session
    }

    /// Seeds the cache from the session's store.
    ///
    /// # Errors
    ///
    /// - [`CartError::SyncInFlight`]: another operation is running.
    /// - [`CartError::Store`]: the store could not be read.
    #[tracing::instrument(name = "cart.controller.load", skip(self), fields(cart = ?self.session.cart_key()), err)]
    pub async fn load(&self) -> Result<CartItems, CartError> {
        let _guard = InFlight::acquire(&self.in_flight)?;

        let key = self.session.cart_key();
        let items: CartItems = Arc::from(self.stores.for_session(&self.session).read_items(key).await?);

        self.cache.set_items(key, Arc::clone(&items));

        debug!(item_count = items.len(), "loaded cart");

        Ok(items)
    }

    /// The current cart, as cached.
    pub fn items(&self) -> CartItems {
        self.cache
            .items(self.session.cart_key())
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    /// Adds a product, merging into an existing line for the same product and option.
    ///
    /// Returns whether an existing line absorbed the quantity.
    ///
    /// # Errors
    ///
    /// - [`CartError::SyncInFlight`]: another operation is running.
    /// - [`CartError::Sync`]: the cart could not be committed and was rolled back.
    #[tracing::instrument(
        name = "cart.controller.add_product",
        skip(self, product, option),
        fields(product_id = %product.id, quantity = quantity.get()),
        err
    )]
    pub async fn add_product(
        &self,
        product: &Product<'static>,
        option: Option<&ProductOption<'static>>,
        quantity: NonZeroU32,
    ) -> Result<bool, CartError> {
        let _guard = InFlight::acquire(&self.in_flight)?;
        let previous = self.items();

        let outcome = add_product_to_cart(&previous, product, option, quantity, &self.ids);

        self.commit(previous, outcome.items, ADD_FAILED).await?;

        info!(merged = outcome.was_existing_item, "added product to cart");

        Ok(outcome.was_existing_item)
    }

    /// Adds a reform line. Reforms never merge.
    ///
    /// # Errors
    ///
    /// - [`CartError::SyncInFlight`]: another operation is running.
    /// - [`CartError::Sync`]: the cart could not be committed and was rolled back.
    #[tracing::instrument(name = "cart.controller.add_reform", skip(self, reform), err)]
    pub async fn add_reform(
        &self,
        reform: ReformData<'static>,
        quantity: NonZeroU32,
    ) -> Result<(), CartError> {
        let _guard = InFlight::acquire(&self.in_flight)?;
        let previous = self.items();

        let next = add_reform_to_cart(&previous, reform, quantity, &self.ids);

        self.commit(previous, next, ADD_FAILED).await
    }

    /// Removes a line. Unknown ids leave the cart unchanged.
    ///
    /// # Errors
    ///
    /// - [`CartError::SyncInFlight`]: another operation is running.
    /// - [`CartError::Sync`]: the cart could not be committed and was rolled back.
    #[tracing::instrument(name = "cart.controller.remove_item", skip(self), fields(line_item = %id), err)]
    pub async fn remove_item(&self, id: &LineItemId) -> Result<(), CartError> {
        let _guard = InFlight::acquire(&self.in_flight)?;
        let previous = self.items();

        let next = remove_cart_item(&previous, id);

        self.commit(previous, next, REMOVE_FAILED).await
    }

    /// Sets a line's quantity.
    ///
    /// Returns `false` without touching the cache or store when `quantity` is below one.
    ///
    /// # Errors
    ///
    /// - [`CartError::SyncInFlight`]: another operation is running.
    /// - [`CartError::Sync`]: the cart could not be committed and was rolled back.
    #[tracing::instrument(name = "cart.controller.update_quantity", skip(self), fields(line_item = %id), err)]
    pub async fn update_quantity(&self, id: &LineItemId, quantity: u32) -> Result<bool, CartError> {
        let _guard = InFlight::acquire(&self.in_flight)?;
        let previous = self.items();

        let next = match update_cart_item_quantity(&previous, id, quantity) {
            Cow::Borrowed(_) => {
                debug!("quantity below one, update skipped");

                return Ok(false);
            }
            Cow::Owned(next) => next,
        };

        self.commit(previous, next, QUANTITY_FAILED).await?;

        Ok(true)
    }

    /// Attaches a coupon to a line, or clears it with `None`.
    ///
    /// # Errors
    ///
    /// - [`CartError::SyncInFlight`]: another operation is running.
    /// - [`CartError::Sync`]: the cart could not be committed and was rolled back.
    #[tracing::instrument(
        name = "cart.controller.apply_coupon",
        skip(self, coupon),
        fields(line_item = %id, coupon = ?coupon.as_ref().map(|c| c.coupon.id)),
        err
    )]
    pub async fn apply_coupon(
        &self,
        id: &LineItemId,
        coupon: Option<AppliedCoupon<'static>>,
    ) -> Result<(), CartError> {
        let _guard = InFlight::acquire(&self.in_flight)?;
        let previous = self.items();

        let next = apply_cart_item_coupon(&previous, id, coupon);

        self.commit(previous, next, COUPON_FAILED).await
    }

    /// Totals of the current cart.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if an item cannot be priced in `currency`.
    pub fn summary(&self, currency: &'static Currency) -> Result<OrderSummary<'static>, PricingError> {
        calculate_order_summary(&self.items(), currency)
    }

    /// Catalog products related to the current cart.
    pub fn recommendations<'c>(
        &self,
        catalog: &'c [Product<'static>],
        limit: usize,
    ) -> Vec<&'c Product<'static>> {
        recommended_products(&self.items(), catalog, limit)
    }

    async fn commit(
        &self,
        previous: CartItems,
        next: Vec<LineItem<'static>>,
        error_message: &str,
    ) -> Result<(), CartError> {
        let reporter = Arc::clone(&self.reporter);

        sync_cart_items_with_rollback(
            self.cache.as_ref(),
            &self.stores,
            SyncRequest {
                session: self.session,
                next_items: Arc::from(next),
                previous_items: previous,
                error_message,
            },
            move |message: &str| reporter.report(message),
        )
        .await?;

        Ok(())
    }
}

/// Marks the controller busy until dropped.
struct InFlight<'c>(&'c AtomicBool);

impl<'c> InFlight<'c> {
    fn acquire(flag: &'c AtomicBool) -> Result<Self, CartError> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map(|_| Self(flag))
            .map_err(|_busy| CartError::SyncInFlight)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use rusty_money::{Money, iso::KRW};
    use testresult::TestResult;

    use crate::{
        items::test_support::*,
        products::{OptionId, ProductId},
        sync::{CartKey, CartStore, MemoryCartCache, MemoryCartStore, MockCartStore},
    };

    use super::*;

    type Reports = Arc<Mutex<Vec<String>>>;

    fn guest_controller(
        guest: Arc<dyn CartStore>,
    ) -> (CartController<fn(ProductId, Option<OptionId>) -> LineItemId>, Reports) {
        let reports: Reports = Arc::default();
        let sink = Arc::clone(&reports);

        let controller = CartController::new(
            Session::Guest,
            Arc::new(MemoryCartCache::new()),
            CartStores {
                guest,
                remote: Arc::new(MockCartStore::new()),
            },
            (|product: ProductId, option: Option<OptionId>| {
                LineItemId(format!("{product}-{}", option.map_or(0, |o| o.0)))
            }) as fn(ProductId, Option<OptionId>) -> LineItemId,
            Arc::new(move |message: &str| {
                if let Ok(mut reports) = sink.lock() {
                    reports.push(message.to_string());
                }
            }),
        );

        (controller, reports)
    }

    #[tokio::test]
    async fn adding_twice_merges_and_commits() -> TestResult {
        let (controller, reports) = guest_controller(Arc::new(MemoryCartStore::new()));
        let product = tie(1, 10_000);

        assert!(!controller.add_product(&product, None, qty(1)).await?);
        assert!(controller.add_product(&product, None, qty(2)).await?);

        let items = controller.items();

        assert_eq!(items.len(), 1);
        assert_eq!(items.first().map(|item| item.quantity().get()), Some(3));
        assert!(reports.lock().map(|r| r.is_empty()).unwrap_or(false));

        Ok(())
    }

    #[tokio::test]
    async fn zero_quantity_update_skips_the_store() -> TestResult {
        let mut guest = MockCartStore::new();
        guest.expect_write_items().times(1).returning(|_, _| Ok(()));

        let (controller, _reports) = guest_controller(Arc::new(guest));

        controller.add_product(&tie(1, 10_000), None, qty(1)).await?;

        let updated = controller.update_quantity(&LineItemId::from("1-0"), 0).await?;

        assert!(!updated);
        assert_eq!(controller.items().first().map(|i| i.quantity().get()), Some(1));

        Ok(())
    }

    #[tokio::test]
    async fn failed_write_reports_once_and_restores() -> TestResult {
        let mut guest = MockCartStore::new();
        let mut seq = mockall::Sequence::new();

        guest
            .expect_write_items()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        guest
            .expect_write_items()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(StoreError::Unavailable("disk full".to_string())));
        guest
            .expect_write_items()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let (controller, reports) = guest_controller(Arc::new(guest));

        controller.add_product(&tie(1, 10_000), None, qty(1)).await?;
        let before = controller.items();

        let result = controller.remove_item(&LineItemId::from("1-0")).await;

        assert!(matches!(result, Err(CartError::Sync(SyncError::WriteFailed(_)))));
        assert_eq!(controller.items(), before);
        assert_eq!(
            reports.lock().map(|r| r.clone()).unwrap_or_default(),
            vec![REMOVE_FAILED.to_string()]
        );

        Ok(())
    }

    #[tokio::test]
    async fn load_seeds_the_cache_from_the_store() -> TestResult {
        let store = Arc::new(MemoryCartStore::new());
        store
            .write_items(CartKey::Guest, &[product_item("saved", tie(9, 5_000), 2)])
            .await?;

        let (controller, _reports) = guest_controller(store);

        assert!(controller.items().is_empty());

        let loaded = controller.load().await?;

        assert_eq!(loaded.len(), 1);
        assert_eq!(controller.items(), loaded);

        Ok(())
    }

    #[tokio::test]
    async fn summary_and_coupon_flow() -> TestResult {
        let (controller, _reports) = guest_controller(Arc::new(MemoryCartStore::new()));

        controller.add_product(&tie(1, 10_000), None, qty(2)).await?;
        controller
            .apply_coupon(&LineItemId::from("1-0"), Some(fixed_coupon(1_000)))
            .await?;

        let summary = controller.summary(KRW)?;

        assert_eq!(summary.totals.original_price, Money::from_minor(20_000, KRW));
        assert_eq!(summary.totals.total_discount, Money::from_minor(2_000, KRW));
        assert_eq!(summary.total_quantity, 2);

        Ok(())
    }

    #[tokio::test]
    async fn reform_lines_get_their_own_ids() -> TestResult {
        let (controller, _reports) = guest_controller(Arc::new(MemoryCartStore::new()));

        controller.add_reform(reform_data(15_000), qty(1)).await?;
        controller.add_reform(reform_data(15_000), qty(1)).await?;

        let items = controller.items();

        assert_eq!(items.len(), 2);
        assert!(items.iter().all(LineItem::is_reform_item));
        assert_ne!(items.first().map(LineItem::id), items.last().map(LineItem::id));

        Ok(())
    }

    #[test]
    fn in_flight_guard_is_exclusive_and_released_on_drop() {
        let flag = AtomicBool::new(false);

        let guard = InFlight::acquire(&flag);

        assert!(guard.is_ok());
        assert!(matches!(InFlight::acquire(&flag), Err(CartError::SyncInFlight)));

        drop(guard);

        assert!(InFlight::acquire(&flag).is_ok());
    }
}
