//! Storefront cart demo
//!
//! Loads a fixture set, replays its cart script through a [`CartController`] backed by in-memory
//! stores, then prints the cart summary and recommendations.
//!
//! Use `-f` to pick the fixture set and `-r` to limit the number of recommendations.

use std::{
    io::{self, Write},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use storefront_cart::{
    config::CartConfig,
    controller::{CartController, CartError},
    coupons::AppliedCoupon,
    fixtures::{
        Fixture,
        carts::{CartAction, CartScript},
    },
    items::{LineItem, LineItemId, UuidIdGenerator},
    receipt::CartSummary,
    sync::{CartKey, CartStore, CartStores, MemoryCartCache, MemoryCartStore, StoreError},
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = CartConfig::load().unwrap_or_else(|err| err.exit());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let fixture = Fixture::from_set_in(config.fixtures_dir.clone(), &config.fixture)
        .with_context(|| format!("loading fixture set '{}'", config.fixture))?;

    let script = fixture
        .load_cart(&config.fixture)
        .with_context(|| format!("loading cart script '{}'", config.fixture))?;

    let currency = fixture.currency()?;

    info!(
        fixture = %config.fixture,
        steps = script.actions.len(),
        logged_in = script.session.is_logged_in(),
        "replaying cart script"
    );

    let controller = replay(script).await?;
    let items = controller.items();

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    CartSummary::from_items(&items, currency)?.write_to(&mut handle)?;

    let recommended = controller.recommendations(fixture.catalog(), config.recommendations);

    if !recommended.is_empty() {
        writeln!(handle, " You might also like:")?;

        for product in recommended {
            writeln!(handle, "   {} ({})", product.name, product.price)?;
        }

        writeln!(handle)?;
    }

    Ok(())
}

/// Runs every action of `script` against a fresh cart.
///
/// Steps whose write was rolled back are logged and skipped; a failed rollback aborts the replay.
async fn replay(script: CartScript) -> Result<CartController<UuidIdGenerator>> {
    let store = Arc::new(FlakyCartStore::default());

    let controller = CartController::new(
        script.session,
        Arc::new(MemoryCartCache::new()),
        CartStores {
            guest: Arc::clone(&store) as Arc<dyn CartStore>,
            remote: Arc::clone(&store) as Arc<dyn CartStore>,
        },
        UuidIdGenerator,
        Arc::new(|message: &str| warn!(user_message = message, "cart error reported to user")),
    );

    controller.load().await?;

    for (step, action) in script.actions.into_iter().enumerate() {
        debug!(step, "replaying step");

        let outcome = match action {
            CartAction::AddProduct {
                product,
                option,
                quantity,
            } => controller
                .add_product(&product, option.as_ref(), quantity)
                .await
                .map(|_merged| ()),
            CartAction::AddReform { reform, quantity } => {
                controller.add_reform(reform, quantity).await
            }
            CartAction::UpdateQuantity { line, quantity } => {
                let Some(id) = line_id(&controller.items(), line) else {
                    warn!(step, line, "no cart line at position");
                    continue;
                };

                controller.update_quantity(&id, quantity).await.map(|applied| {
                    if !applied {
                        info!(step, line, "quantity update rejected");
                    }
                })
            }
            CartAction::Remove { line } => {
                let Some(id) = line_id(&controller.items(), line) else {
                    warn!(step, line, "no cart line at position");
                    continue;
                };

                controller.remove_item(&id).await
            }
            CartAction::ApplyCoupon { line, coupon } => {
                let Some(id) = line_id(&controller.items(), line) else {
                    warn!(step, line, "no cart line at position");
                    continue;
                };

                controller
                    .apply_coupon(&id, coupon.map(AppliedCoupon::issue))
                    .await
            }
            CartAction::FailNextWrite => {
                store.fail_next_write();
                continue;
            }
        };

        match outcome {
            Ok(()) => {}
            Err(CartError::Sync(error)) if !error.requires_reload() => {
                warn!(step, %error, "step rolled back");
            }
            Err(error) => return Err(error).with_context(|| format!("replaying step {step}")),
        }
    }

    Ok(controller)
}

fn line_id(items: &[LineItem<'_>], line: usize) -> Option<LineItemId> {
    items.get(line).map(|item| item.id().clone())
}

/// In-memory store whose next write can be made to fail.
#[derive(Debug, Default)]
struct FlakyCartStore {
    inner: MemoryCartStore,
    fail_next: AtomicBool,
}

impl FlakyCartStore {
    fn fail_next_write(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CartStore for FlakyCartStore {
    async fn write_items(&self, key: CartKey, items: &[LineItem<'static>]) -> Result<(), StoreError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated outage".to_string()));
        }

        self.inner.write_items(key, items).await
    }

    async fn read_items(&self, key: CartKey) -> Result<Vec<LineItem<'static>>, StoreError> {
        self.inner.read_items(key).await
    }
}
