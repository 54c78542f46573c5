//! Checkout/Pricing Adapter
//!
//! Owns the billing client lifecycle and the cached price mapping.
//!
//! ```text
//!                configure()            Ok
//! Uninitialized ────────────▶ Initializing ──────▶ Ready
//!                                  │
//!                                  └────────────▶ Failed
//!                                       Err
//! ```
//!
//! Reconfiguring with a different `Arc<AdapterConfig>` restarts from
//! `Initializing`, drops the previous client and the prices it fetched, and
//! invalidates previews still in flight on it. Both initializations and
//! price previews carry a sequence number; a result that is no longer the
//! newest is discarded instead of overwriting fresher state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

use crate::config::AdapterConfig;
use crate::error::{CheckoutError, Result};
use crate::model::{BillingCycle, CheckoutOptions, PricePreviewResponse, ProductDetails, ProductPrices};
use crate::pricing::{build_preview_request, reconcile_prices};
use crate::provider::{BillingClient, BillingProvider};

/// Lock a mutex, recovering the data if a previous holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Billing client lifecycle
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum LifecycleState {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    Failed(String),
}

/// Status of the cached prices
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum PriceStatus {
    /// Never requested
    #[default]
    Idle,
    Loading,
    Ready,
    /// Last request failed; prices keep their previous value
    Error(String),
}

/// Everything a UI needs to render pricing
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AdapterSnapshot {
    pub lifecycle: LifecycleState,
    pub billing_cycle: BillingCycle,
    pub prices: ProductPrices,
    pub price_status: PriceStatus,
    pub fetched_at: Option<DateTime<Utc>>,
}

struct Inner<C> {
    config: Option<Arc<AdapterConfig>>,
    generation: u64,
    client: Option<Arc<C>>,
    latest_request: u64,
    snapshot: AdapterSnapshot,
}

/// Checkout and price preview adapter over a [`BillingProvider`]
pub struct CheckoutAdapter<P: BillingProvider> {
    provider: P,
    inner: Mutex<Inner<P::Client>>,
    updates: watch::Sender<AdapterSnapshot>,
}

impl<P: BillingProvider> CheckoutAdapter<P> {
    /// Create an adapter in the `Uninitialized` state
    pub fn new(provider: P) -> Self {
        let snapshot = AdapterSnapshot::default();
        let (updates, _) = watch::channel(snapshot.clone());

        Self {
            provider,
            inner: Mutex::new(Inner {
                config: None,
                generation: 0,
                client: None,
                latest_request: 0,
                snapshot,
            }),
            updates,
        }
    }

    /// Create an adapter and run the first initialization
    pub async fn start(provider: P, config: Arc<AdapterConfig>) -> Self {
        let adapter = Self::new(provider);
        adapter.configure(config).await;
        adapter
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Apply `config`, initializing a new client if it is not the current one
    ///
    /// Configs are compared by identity: passing the same `Arc` again is a
    /// no-op, whatever the current state. Use [`reinitialize`](Self::reinitialize)
    /// to retry after a failure.
    pub async fn configure(&self, config: Arc<AdapterConfig>) -> LifecycleState {
        let generation = {
            let mut inner = lock(&self.inner);
            if inner
                .config
                .as_ref()
                .is_some_and(|current| Arc::ptr_eq(current, &config))
            {
                return inner.snapshot.lifecycle.clone();
            }
            inner.config = Some(config.clone());
            self.begin_initialization(&mut inner)
        };

        self.run_initialization(&config, generation).await
    }

    /// Restart initialization with the current config
    pub async fn reinitialize(&self) -> LifecycleState {
        let (config, generation) = {
            let mut inner = lock(&self.inner);
            let Some(config) = inner.config.clone() else {
                tracing::error!("Cannot reinitialize billing client: no configuration");
                return inner.snapshot.lifecycle.clone();
            };
            let generation = self.begin_initialization(&mut inner);
            (config, generation)
        };

        self.run_initialization(&config, generation).await
    }

    fn begin_initialization(&self, inner: &mut Inner<P::Client>) -> u64 {
        inner.generation += 1;
        inner.client = None;
        // Previews issued on the old client must not land
        inner.latest_request += 1;
        inner.snapshot.prices.clear();
        inner.snapshot.price_status = PriceStatus::Idle;
        inner.snapshot.fetched_at = None;
        inner.snapshot.lifecycle = LifecycleState::Initializing;
        self.publish(inner);
        inner.generation
    }

    async fn run_initialization(&self, config: &AdapterConfig, generation: u64) -> LifecycleState {
        tracing::debug!(
            provider = self.provider.name(),
            environment = %config.environment,
            generation,
            "Initializing billing client"
        );

        let result = self.provider.initialize(config).await;

        let mut inner = lock(&self.inner);
        if inner.generation != generation {
            tracing::debug!(
                generation,
                current = inner.generation,
                "Discarding result of superseded initialization"
            );
            return inner.snapshot.lifecycle.clone();
        }

        match result {
            Ok(client) => {
                inner.client = Some(Arc::new(client));
                inner.snapshot.lifecycle = LifecycleState::Ready;
                tracing::info!(
                    provider = self.provider.name(),
                    environment = %config.environment,
                    "Billing client initialized"
                );
            }
            Err(e) => {
                inner.snapshot.lifecycle = LifecycleState::Failed(e.to_string());
                tracing::error!(
                    provider = self.provider.name(),
                    error = %e,
                    "Error initializing billing client"
                );
            }
        }

        self.publish(&inner);
        inner.snapshot.lifecycle.clone()
    }

    /// Initialized client handle, if the adapter is ready
    pub fn client(&self) -> Option<Arc<P::Client>> {
        lock(&self.inner).client.clone()
    }

    pub fn lifecycle(&self) -> LifecycleState {
        lock(&self.inner).snapshot.lifecycle.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.lifecycle() == LifecycleState::Ready
    }

    /// Open the vendor checkout with `options`, unchanged
    ///
    /// Returns [`CheckoutError::NotReady`] without calling the provider when
    /// the client is not initialized. Nothing is queued for later.
    pub async fn open_checkout(&self, options: &CheckoutOptions) -> Result<()> {
        let Some(client) = self.client() else {
            tracing::error!("Billing client not initialized, checkout not opened");
            return Err(CheckoutError::NotReady);
        };

        match client.open_checkout(options).await {
            Ok(()) => {
                tracing::info!(items = options.items.len(), "Checkout opened");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Error opening checkout");
                Err(CheckoutError::Checkout(e.to_string()))
            }
        }
    }

    /// Fetch localized prices for `products` under `cycle`
    ///
    /// `cycle` becomes the current billing cycle right away. On success the
    /// price mapping is replaced wholesale; on failure it is left as it was.
    /// If another call or a reconfigure starts before this one resolves, this
    /// one returns [`CheckoutError::Superseded`] and leaves the state alone.
    pub async fn get_prices(
        &self,
        products: &[ProductDetails],
        cycle: BillingCycle,
    ) -> Result<ProductPrices> {
        let (client, request_id) = {
            let mut inner = lock(&self.inner);
            let Some(client) = inner.client.clone() else {
                tracing::error!(%cycle, "Billing client not initialized, prices not fetched");
                return Err(CheckoutError::NotReady);
            };
            inner.latest_request += 1;
            inner.snapshot.billing_cycle = cycle;
            inner.snapshot.price_status = PriceStatus::Loading;
            self.publish(&inner);
            (client, inner.latest_request)
        };

        let result = if products.is_empty() {
            tracing::debug!(request_id, "Empty catalog, skipping price preview");
            Ok(PricePreviewResponse::default())
        } else {
            let request = build_preview_request(products, cycle);
            client.preview_prices(&request).await
        };

        let mut inner = lock(&self.inner);
        if inner.latest_request != request_id {
            tracing::debug!(
                request_id,
                latest = inner.latest_request,
                "Discarding superseded price preview"
            );
            return Err(CheckoutError::Superseded {
                request_id,
                latest: inner.latest_request,
            });
        }

        match result {
            Ok(response) => {
                let prices = reconcile_prices(products, &response);
                tracing::info!(
                    %cycle,
                    requested = products.len(),
                    priced = prices.len(),
                    "Price preview applied"
                );
                inner.snapshot.prices = prices.clone();
                inner.snapshot.price_status = PriceStatus::Ready;
                inner.snapshot.fetched_at = Some(Utc::now());
                self.publish(&inner);
                Ok(prices)
            }
            Err(e) => {
                tracing::error!(%cycle, error = %e, "Error fetching price preview");
                inner.snapshot.price_status = PriceStatus::Error(e.to_string());
                self.publish(&inner);
                Err(CheckoutError::PricePreview(e.to_string()))
            }
        }
    }

    pub fn product_prices(&self) -> ProductPrices {
        lock(&self.inner).snapshot.prices.clone()
    }

    /// Cached price for one product
    pub fn price_for(&self, product_id: &str) -> Option<String> {
        lock(&self.inner).snapshot.prices.get(product_id).cloned()
    }

    pub fn billing_cycle(&self) -> BillingCycle {
        lock(&self.inner).snapshot.billing_cycle
    }

    /// Change the current cycle without fetching prices
    pub fn set_billing_cycle(&self, cycle: BillingCycle) {
        let mut inner = lock(&self.inner);
        inner.snapshot.billing_cycle = cycle;
        self.publish(&inner);
    }

    pub fn price_status(&self) -> PriceStatus {
        lock(&self.inner).snapshot.price_status.clone()
    }

    pub fn snapshot(&self) -> AdapterSnapshot {
        lock(&self.inner).snapshot.clone()
    }

    /// Receiver that sees every state transition
    pub fn subscribe(&self) -> watch::Receiver<AdapterSnapshot> {
        self.updates.subscribe()
    }

    fn publish(&self, inner: &Inner<P::Client>) {
        self.updates.send_replace(inner.snapshot.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::mock::MockBillingProvider;
    use crate::model::{LineItem, PricePreviewResponse};

    fn config(token: &str) -> Arc<AdapterConfig> {
        Arc::new(AdapterConfig::new(Environment::Sandbox, token))
    }

    fn catalog() -> Vec<ProductDetails> {
        vec![ProductDetails::new("A", "m1", "y1")]
    }

    async fn ready_adapter(provider: MockBillingProvider) -> CheckoutAdapter<MockBillingProvider> {
        let adapter = CheckoutAdapter::start(provider, config("test_token")).await;
        assert_eq!(adapter.lifecycle(), LifecycleState::Ready);
        adapter
    }

    #[tokio::test]
    async fn test_initialization_sets_client_once() {
        let provider = MockBillingProvider::new();
        let adapter = CheckoutAdapter::new(provider.clone());
        assert_eq!(adapter.lifecycle(), LifecycleState::Uninitialized);
        assert!(adapter.client().is_none());

        let cfg = config("test_token");
        assert_eq!(adapter.configure(cfg.clone()).await, LifecycleState::Ready);
        let before = adapter.snapshot();
        assert!(adapter.client().is_some());

        // Same config again: nothing restarts
        assert_eq!(adapter.configure(cfg).await, LifecycleState::Ready);
        assert_eq!(provider.init_calls(), 1);
        assert_eq!(adapter.snapshot(), before);
    }

    #[tokio::test]
    async fn test_initialization_failure() {
        let provider = MockBillingProvider::new();
        provider.fail_init("invalid token");
        let adapter = CheckoutAdapter::start(provider.clone(), config("bad")).await;

        assert!(matches!(adapter.lifecycle(), LifecycleState::Failed(reason) if reason.contains("invalid token")));
        assert!(adapter.client().is_none());

        provider.recover();
        assert_eq!(adapter.reinitialize().await, LifecycleState::Ready);
        assert_eq!(provider.init_calls(), 2);
    }

    #[tokio::test]
    async fn test_checkout_requires_ready_client() {
        let provider = MockBillingProvider::new();
        let adapter = CheckoutAdapter::new(provider.clone());

        let result = adapter.open_checkout(&CheckoutOptions::for_price("y1")).await;
        assert!(matches!(result, Err(CheckoutError::NotReady)));

        provider.fail_init("nope");
        adapter.configure(config("test_token")).await;
        let result = adapter.open_checkout(&CheckoutOptions::for_price("y1")).await;
        assert!(matches!(result, Err(CheckoutError::NotReady)));

        assert_eq!(provider.checkout_calls(), 0);
    }

    #[tokio::test]
    async fn test_checkout_forwards_options() {
        let provider = MockBillingProvider::new();
        let adapter = ready_adapter(provider.clone()).await;

        let options = CheckoutOptions::for_price("y1");
        adapter.open_checkout(&options).await.unwrap();

        assert_eq!(provider.checkouts(), vec![options]);
    }

    #[tokio::test]
    async fn test_checkout_failure_is_reported() {
        let provider = MockBillingProvider::new();
        let adapter = ready_adapter(provider.clone()).await;
        provider.fail_checkout("overlay blocked");

        let result = adapter.open_checkout(&CheckoutOptions::for_price("y1")).await;
        assert!(matches!(result, Err(CheckoutError::Checkout(_))));
    }

    #[tokio::test]
    async fn test_get_prices_yearly() {
        let provider = MockBillingProvider::new().with_price("y1", "$10.00");
        let adapter = ready_adapter(provider.clone()).await;

        let prices = adapter.get_prices(&catalog(), BillingCycle::Year).await.unwrap();

        assert_eq!(prices.len(), 1);
        assert_eq!(adapter.price_for("A").as_deref(), Some("$10.00"));
        assert_eq!(adapter.billing_cycle(), BillingCycle::Year);
        assert_eq!(adapter.price_status(), PriceStatus::Ready);
        assert!(adapter.snapshot().fetched_at.is_some());

        let requests = provider.preview_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].items[0].price_id, "y1");
        assert_eq!(requests[0].items[0].quantity, 1);
    }

    #[tokio::test]
    async fn test_get_prices_drops_unknown_line_items() {
        let provider = MockBillingProvider::new();
        let adapter = ready_adapter(provider.clone()).await;

        provider
            .gate_preview()
            .send(Ok(PricePreviewResponse::from_line_items(vec![
                LineItem::new("m1", "$1.00"),
                LineItem::new("other", "$2.00"),
            ])))
            .unwrap();

        let prices = adapter.get_prices(&catalog(), BillingCycle::Month).await.unwrap();
        assert_eq!(prices.len(), 1);
        assert!(!prices.contains_key("other"));
    }

    #[tokio::test]
    async fn test_get_prices_replaces_previous_mapping() {
        let provider = MockBillingProvider::new()
            .with_price("y1", "$10.00")
            .with_price("y2", "$20.00");
        let adapter = ready_adapter(provider.clone()).await;

        let full = vec![
            ProductDetails::new("A", "m1", "y1"),
            ProductDetails::new("B", "m2", "y2"),
        ];
        adapter.get_prices(&full, BillingCycle::Year).await.unwrap();
        assert_eq!(adapter.product_prices().len(), 2);

        adapter.get_prices(&catalog(), BillingCycle::Year).await.unwrap();
        let prices = adapter.product_prices();
        assert_eq!(prices.len(), 1);
        assert!(!prices.contains_key("B"));
    }

    #[tokio::test]
    async fn test_get_prices_before_ready_is_noop() {
        let provider = MockBillingProvider::new();
        let adapter = CheckoutAdapter::new(provider.clone());

        let result = adapter.get_prices(&catalog(), BillingCycle::Month).await;

        assert!(matches!(result, Err(CheckoutError::NotReady)));
        assert_eq!(adapter.billing_cycle(), BillingCycle::Year);
        assert_eq!(adapter.price_status(), PriceStatus::Idle);
        assert_eq!(provider.preview_calls(), 0);
    }

    #[tokio::test]
    async fn test_rejected_preview_keeps_prices_and_updates_cycle() {
        let provider = MockBillingProvider::new().with_price("y1", "$10.00");
        let adapter = ready_adapter(provider.clone()).await;
        adapter.get_prices(&catalog(), BillingCycle::Year).await.unwrap();

        provider.fail_preview("rate limited");
        let result = adapter.get_prices(&catalog(), BillingCycle::Month).await;

        assert!(matches!(result, Err(CheckoutError::PricePreview(_))));
        assert_eq!(adapter.price_for("A").as_deref(), Some("$10.00"));
        assert_eq!(adapter.billing_cycle(), BillingCycle::Month);
        assert!(matches!(adapter.price_status(), PriceStatus::Error(reason) if reason.contains("rate limited")));
    }

    #[tokio::test]
    async fn test_stale_price_response_is_ignored() {
        let provider = MockBillingProvider::new();
        let adapter = Arc::new(ready_adapter(provider.clone()).await);
        let month_gate = provider.gate_preview();
        let year_gate = provider.gate_preview();

        let month = tokio::spawn({
            let adapter = adapter.clone();
            async move { adapter.get_prices(&catalog(), BillingCycle::Month).await }
        });
        while provider.preview_calls() < 1 {
            tokio::task::yield_now().await;
        }

        let year = tokio::spawn({
            let adapter = adapter.clone();
            async move { adapter.get_prices(&catalog(), BillingCycle::Year).await }
        });
        while provider.preview_calls() < 2 {
            tokio::task::yield_now().await;
        }

        // Year resolves first, month last
        year_gate
            .send(Ok(PricePreviewResponse::from_line_items(vec![LineItem::new("y1", "$100.00")])))
            .unwrap();
        let year = year.await.unwrap();
        month_gate
            .send(Ok(PricePreviewResponse::from_line_items(vec![LineItem::new("m1", "$10.00")])))
            .unwrap();
        let month = month.await.unwrap();

        assert!(year.is_ok());
        assert!(matches!(
            month,
            Err(CheckoutError::Superseded { request_id: 1, latest: 2 })
        ));
        assert_eq!(adapter.price_for("A").as_deref(), Some("$100.00"));
        assert_eq!(adapter.billing_cycle(), BillingCycle::Year);
        assert_eq!(adapter.price_status(), PriceStatus::Ready);
    }

    #[tokio::test]
    async fn test_stale_initialization_is_ignored() {
        let provider = MockBillingProvider::new();
        let adapter = Arc::new(CheckoutAdapter::new(provider.clone()));
        let first_gate = provider.gate_init();

        let first = tokio::spawn({
            let adapter = adapter.clone();
            async move { adapter.configure(config("test_first")).await }
        });
        while provider.init_calls() < 1 {
            tokio::task::yield_now().await;
        }
        assert_eq!(adapter.lifecycle(), LifecycleState::Initializing);

        assert_eq!(adapter.configure(config("test_second")).await, LifecycleState::Ready);

        first_gate.send(Ok(())).unwrap();
        assert_eq!(first.await.unwrap(), LifecycleState::Ready);

        let client = adapter.client().unwrap();
        assert_eq!(client.token(), "test_second");
        assert_eq!(provider.init_calls(), 2);
    }

    #[tokio::test]
    async fn test_reconfigure_drops_previous_client() {
        let provider = MockBillingProvider::new();
        let adapter = ready_adapter(provider.clone()).await;
        provider.fail_init("revoked");

        adapter.configure(config("test_rotated")).await;

        assert!(adapter.client().is_none());
        assert!(!adapter.is_ready());
    }

    #[tokio::test]
    async fn test_reconfigure_discards_in_flight_preview() {
        let provider = MockBillingProvider::new();
        let adapter = Arc::new(ready_adapter(provider.clone()).await);
        let gate = provider.gate_preview();

        let pending = tokio::spawn({
            let adapter = adapter.clone();
            async move { adapter.get_prices(&catalog(), BillingCycle::Year).await }
        });
        while provider.preview_calls() < 1 {
            tokio::task::yield_now().await;
        }
        assert_eq!(adapter.price_status(), PriceStatus::Loading);

        provider.fail_init("revoked");
        let production = Arc::new(AdapterConfig::new(Environment::Production, "live_new"));
        assert!(matches!(adapter.configure(production).await, LifecycleState::Failed(_)));

        gate.send(Ok(PricePreviewResponse::from_line_items(vec![LineItem::new("y1", "$OLD")])))
            .unwrap();
        let result = pending.await.unwrap();

        assert!(matches!(result, Err(CheckoutError::Superseded { .. })));
        assert!(adapter.product_prices().is_empty());
        assert_eq!(adapter.price_status(), PriceStatus::Idle);
        assert!(adapter.snapshot().fetched_at.is_none());
        assert!(matches!(adapter.lifecycle(), LifecycleState::Failed(reason) if reason.contains("revoked")));
    }

    #[tokio::test]
    async fn test_reconfigure_clears_prices_from_previous_client() {
        let provider = MockBillingProvider::new().with_price("y1", "$10.00");
        let adapter = ready_adapter(provider.clone()).await;
        adapter.get_prices(&catalog(), BillingCycle::Year).await.unwrap();

        adapter.configure(config("test_rotated")).await;

        assert!(adapter.is_ready());
        assert!(adapter.product_prices().is_empty());
        assert_eq!(adapter.price_status(), PriceStatus::Idle);
        assert_eq!(adapter.billing_cycle(), BillingCycle::Year);
    }

    #[tokio::test]
    async fn test_empty_catalog_skips_preview() {
        let provider = MockBillingProvider::new();
        let adapter = ready_adapter(provider.clone()).await;

        let prices = adapter.get_prices(&[], BillingCycle::Month).await.unwrap();

        assert!(prices.is_empty());
        assert_eq!(provider.preview_calls(), 0);
        assert_eq!(adapter.price_status(), PriceStatus::Ready);
    }

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let provider = MockBillingProvider::new().with_price("m1", "$1.00");
        let adapter = CheckoutAdapter::new(provider);
        let mut updates = adapter.subscribe();

        adapter.configure(config("test_token")).await;
        assert!(updates.has_changed().unwrap());
        assert_eq!(updates.borrow_and_update().lifecycle, LifecycleState::Ready);

        adapter.set_billing_cycle(BillingCycle::Month);
        assert_eq!(updates.borrow_and_update().billing_cycle, BillingCycle::Month);

        adapter.get_prices(&catalog(), BillingCycle::Month).await.unwrap();
        let snapshot = updates.borrow_and_update().clone();
        assert_eq!(snapshot.prices.get("A").map(String::as_str), Some("$1.00"));
        assert_eq!(snapshot.price_status, PriceStatus::Ready);
    }
}
