//! Billing Provider Strategy Pattern
//!
//! The adapter never talks to a payments vendor directly. It goes through
//! two traits, one per lifecycle stage:
//!
//! - [`BillingProvider`] turns an [`AdapterConfig`] into a ready client.
//! - [`BillingClient`] is the initialized handle: it opens checkouts and
//!   previews prices.
//!
//! ```rust,ignore
//! use paddle_checkout::{BillingProvider, PaddleProvider};
//!
//! let client = PaddleProvider::new().initialize(&config).await?;
//! let preview = client.preview_prices(&request).await?;
//! ```
//!
//! In the browser the futures are `!Send`, so the traits drop the `Send`
//! bound on wasm32.

use async_trait::async_trait;

use crate::config::AdapterConfig;
use crate::error::Result;
use crate::model::{CheckoutOptions, PricePreviewRequest, PricePreviewResponse};

/// Creates billing clients from configuration
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait BillingProvider: Send + Sync {
    /// Initialized client handle
    type Client: BillingClient + 'static;

    /// Set up a client for `config`
    async fn initialize(&self, config: &AdapterConfig) -> Result<Self::Client>;

    /// Provider name (for logs)
    fn name(&self) -> &str;
}

/// Capabilities of an initialized billing client
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait BillingClient: Send + Sync {
    /// Hand the options to the vendor checkout
    async fn open_checkout(&self, options: &CheckoutOptions) -> Result<()>;

    /// Localized prices for every item, in one batch call
    async fn preview_prices(&self, request: &PricePreviewRequest) -> Result<PricePreviewResponse>;
}
