//! Checkout Hook
//!
//! Binds a [`CheckoutAdapter`] to the component tree. Every adapter
//! transition is mirrored into signals, so views re-render on lifecycle,
//! price, and billing-cycle changes.

use std::sync::Arc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use paddle_checkout::{
    AdapterConfig, BillingCycle, BillingProvider, CheckoutAdapter, CheckoutError,
    CheckoutOptions, LifecycleState, PriceStatus, ProductDetails, ProductPrices,
};

/// Reactive handle returned by [`use_checkout`]
pub struct CheckoutHandle<P: BillingProvider + 'static> {
    adapter: StoredValue<Arc<CheckoutAdapter<P>>>,
    pub lifecycle: ReadSignal<LifecycleState>,
    pub product_prices: ReadSignal<ProductPrices>,
    pub billing_cycle: ReadSignal<BillingCycle>,
    pub price_status: ReadSignal<PriceStatus>,
}

impl<P: BillingProvider + 'static> Clone for CheckoutHandle<P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: BillingProvider + 'static> Copy for CheckoutHandle<P> {}

/// Write `value` only if it differs, so effects don't re-run on every snapshot
///
/// Returns `false` once the signals have been disposed.
fn sync<T>(read: ReadSignal<T>, write: WriteSignal<T>, value: T) -> bool
where
    T: PartialEq + Send + Sync + 'static,
{
    match read.try_with_untracked(|current| *current != value) {
        Some(true) => write.try_set(value).is_none(),
        Some(false) => true,
        None => false,
    }
}

/// Superseded previews are expected whenever the user toggles quickly
fn should_report(err: &CheckoutError) -> bool {
    !matches!(err, CheckoutError::Superseded { .. })
}

/// Create an adapter for `provider` and keep it configured from `config`
///
/// Whenever `config` yields a different `Arc`, the billing client is
/// initialized again.
pub fn use_checkout<P>(provider: P, config: Signal<Arc<AdapterConfig>>) -> CheckoutHandle<P>
where
    P: BillingProvider + 'static,
{
    let adapter = Arc::new(CheckoutAdapter::new(provider));
    let initial = adapter.snapshot();

    let (lifecycle, set_lifecycle) = signal(initial.lifecycle);
    let (product_prices, set_product_prices) = signal(initial.prices);
    let (billing_cycle, set_billing_cycle) = signal(initial.billing_cycle);
    let (price_status, set_price_status) = signal(initial.price_status);

    let mut updates = adapter.subscribe();
    spawn_local(async move {
        // Ends once the adapter is dropped or the owning component unmounts
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            let mounted = sync(lifecycle, set_lifecycle, snapshot.lifecycle)
                && sync(product_prices, set_product_prices, snapshot.prices)
                && sync(billing_cycle, set_billing_cycle, snapshot.billing_cycle)
                && sync(price_status, set_price_status, snapshot.price_status);
            if !mounted {
                break;
            }
        }
    });

    let adapter = StoredValue::new(adapter);

    Effect::new(move |_| {
        let config = config.get();
        let adapter = adapter.get_value();
        spawn_local(async move {
            adapter.configure(config).await;
        });
    });

    CheckoutHandle {
        adapter,
        lifecycle,
        product_prices,
        billing_cycle,
        price_status,
    }
}

impl<P: BillingProvider + 'static> CheckoutHandle<P> {
    /// Open checkout; does nothing (besides logging) until the client is ready
    pub fn open_checkout(&self, options: CheckoutOptions) {
        let adapter = self.adapter.get_value();
        spawn_local(async move {
            if let Err(e) = adapter.open_checkout(&options).await {
                leptos::logging::error!("checkout not opened: {e}");
            }
        });
    }

    /// Fetch prices for `products` under `cycle`; results land in the signals
    pub fn get_prices(&self, products: Vec<ProductDetails>, cycle: BillingCycle) {
        let adapter = self.adapter.get_value();
        spawn_local(async move {
            match adapter.get_prices(&products, cycle).await {
                Err(e) if should_report(&e) => leptos::logging::error!("prices not fetched: {e}"),
                _ => {}
            }
        });
    }

    pub fn set_billing_cycle(&self, cycle: BillingCycle) {
        self.adapter.with_value(|adapter| adapter.set_billing_cycle(cycle));
    }

    /// Initialized client, if any
    pub fn client(&self) -> Option<Arc<P::Client>> {
        self.adapter.with_value(|adapter| adapter.client())
    }

    pub fn is_ready(&self) -> bool {
        self.lifecycle.get() == LifecycleState::Ready
    }

    pub fn price_for(&self, product_id: &str) -> Option<String> {
        self.product_prices.with(|prices| prices.get(product_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_writes_only_changes() {
        let owner = Owner::new();
        owner.set();
        let (read, write) = signal(1);

        assert!(sync(read, write, 1));
        assert!(sync(read, write, 2));
        assert_eq!(read.get_untracked(), 2);
    }

    #[test]
    fn test_sync_stops_after_dispose() {
        let owner = Owner::new();
        owner.set();

        let (read, write) = signal(1);
        read.dispose();
        assert!(!sync(read, write, 2));

        let (read, write) = signal(1);
        write.dispose();
        assert!(!sync(read, write, 2));
        assert!(sync(read, write, 1));
    }

    #[test]
    fn test_superseded_previews_are_not_reported() {
        assert!(!should_report(&CheckoutError::Superseded {
            request_id: 1,
            latest: 2
        }));
        assert!(should_report(&CheckoutError::NotReady));
        assert!(should_report(&CheckoutError::PricePreview("rate limited".into())));
    }
}
