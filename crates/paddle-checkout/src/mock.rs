//! Mock Billing Provider
//!
//! For testing and demo purposes. Prices come from a static table, and
//! failures can be scripted. Gates let a test decide exactly when (and with
//! what) an initialization or price preview resolves.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use crate::adapter::lock;
use crate::config::AdapterConfig;
use crate::error::{CheckoutError, Result};
use crate::model::{
    CheckoutOptions, LineItem, PricePreviewRequest, PricePreviewResponse,
};
use crate::provider::{BillingClient, BillingProvider};

/// Releases a gated initialization (`Err` carries the failure reason)
pub type InitGate = oneshot::Sender<std::result::Result<(), String>>;

/// Releases a gated price preview (`Err` carries the failure reason)
pub type PreviewGate = oneshot::Sender<std::result::Result<PricePreviewResponse, String>>;

#[derive(Default)]
struct MockState {
    prices: Mutex<HashMap<String, String>>,
    init_failure: Mutex<Option<String>>,
    preview_failure: Mutex<Option<String>>,
    checkout_failure: Mutex<Option<String>>,
    init_gates: Mutex<VecDeque<oneshot::Receiver<std::result::Result<(), String>>>>,
    preview_gates: Mutex<VecDeque<oneshot::Receiver<std::result::Result<PricePreviewResponse, String>>>>,
    checkouts: Mutex<Vec<CheckoutOptions>>,
    preview_requests: Mutex<Vec<PricePreviewRequest>>,
    init_calls: AtomicUsize,
    checkout_calls: AtomicUsize,
    preview_calls: AtomicUsize,
}

/// Scriptable in-memory provider
///
/// Clones share state, so a test can keep one clone for assertions while
/// the adapter owns the other.
#[derive(Clone, Default)]
pub struct MockBillingProvider {
    state: Arc<MockState>,
}

impl MockBillingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quote `subtotal` whenever `price_id` is previewed
    pub fn with_price(self, price_id: impl Into<String>, subtotal: impl Into<String>) -> Self {
        lock(&self.state.prices).insert(price_id.into(), subtotal.into());
        self
    }

    /// Make every initialization fail with `reason`
    pub fn fail_init(&self, reason: impl Into<String>) {
        *lock(&self.state.init_failure) = Some(reason.into());
    }

    /// Make every price preview fail with `reason`
    pub fn fail_preview(&self, reason: impl Into<String>) {
        *lock(&self.state.preview_failure) = Some(reason.into());
    }

    /// Make every checkout fail with `reason`
    pub fn fail_checkout(&self, reason: impl Into<String>) {
        *lock(&self.state.checkout_failure) = Some(reason.into());
    }

    /// Clear all scripted failures
    pub fn recover(&self) {
        lock(&self.state.init_failure).take();
        lock(&self.state.preview_failure).take();
        lock(&self.state.checkout_failure).take();
    }

    /// Hold the next initialization until the returned gate is released
    pub fn gate_init(&self) -> InitGate {
        let (tx, rx) = oneshot::channel();
        lock(&self.state.init_gates).push_back(rx);
        tx
    }

    /// Hold the next price preview until the returned gate is released
    pub fn gate_preview(&self) -> PreviewGate {
        let (tx, rx) = oneshot::channel();
        lock(&self.state.preview_gates).push_back(rx);
        tx
    }

    pub fn init_calls(&self) -> usize {
        self.state.init_calls.load(Ordering::SeqCst)
    }

    pub fn checkout_calls(&self) -> usize {
        self.state.checkout_calls.load(Ordering::SeqCst)
    }

    pub fn preview_calls(&self) -> usize {
        self.state.preview_calls.load(Ordering::SeqCst)
    }

    /// Checkouts opened so far, in call order
    pub fn checkouts(&self) -> Vec<CheckoutOptions> {
        lock(&self.state.checkouts).clone()
    }

    /// Preview requests received so far, in call order
    pub fn preview_requests(&self) -> Vec<PricePreviewRequest> {
        lock(&self.state.preview_requests).clone()
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl BillingProvider for MockBillingProvider {
    type Client = MockBillingClient;

    async fn initialize(&self, config: &AdapterConfig) -> Result<MockBillingClient> {
        self.state.init_calls.fetch_add(1, Ordering::SeqCst);

        let gate = lock(&self.state.init_gates).pop_front();
        if let Some(gate) = gate {
            gate.await
                .unwrap_or_else(|_| Err("init gate dropped".into()))
                .map_err(CheckoutError::Initialization)?;
        }

        if let Some(reason) = lock(&self.state.init_failure).clone() {
            return Err(CheckoutError::Initialization(reason));
        }

        Ok(MockBillingClient {
            token: config.token.clone(),
            state: self.state.clone(),
        })
    }

    fn name(&self) -> &str {
        "MockBilling"
    }
}

/// Client handed out by [`MockBillingProvider`]
pub struct MockBillingClient {
    token: String,
    state: Arc<MockState>,
}

impl MockBillingClient {
    /// Token of the config this client was initialized with
    pub fn token(&self) -> &str {
        &self.token
    }

    fn quote(&self, request: &PricePreviewRequest) -> PricePreviewResponse {
        let prices = lock(&self.state.prices);
        let line_items = request
            .items
            .iter()
            .filter_map(|item| {
                prices
                    .get(&item.price_id)
                    .map(|subtotal| LineItem::new(item.price_id.clone(), subtotal.clone()))
            })
            .collect();
        PricePreviewResponse::from_line_items(line_items)
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl BillingClient for MockBillingClient {
    async fn open_checkout(&self, options: &CheckoutOptions) -> Result<()> {
        self.state.checkout_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = lock(&self.state.checkout_failure).clone() {
            return Err(CheckoutError::Checkout(reason));
        }

        lock(&self.state.checkouts).push(options.clone());
        Ok(())
    }

    async fn preview_prices(&self, request: &PricePreviewRequest) -> Result<PricePreviewResponse> {
        self.state.preview_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.state.preview_requests).push(request.clone());

        let gate = lock(&self.state.preview_gates).pop_front();
        if let Some(gate) = gate {
            return gate
                .await
                .unwrap_or_else(|_| Err("preview gate dropped".into()))
                .map_err(|message| CheckoutError::Api {
                    status: 500,
                    code: Some("mock_failure".into()),
                    message,
                });
        }

        if let Some(message) = lock(&self.state.preview_failure).clone() {
            return Err(CheckoutError::Api {
                status: 500,
                code: Some("mock_failure".into()),
                message,
            });
        }

        Ok(self.quote(request))
    }
}
