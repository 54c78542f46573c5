//! # paddle-checkout
//!
//! Checkout and localized price previews for a tiered subscription catalog,
//! backed by Paddle Billing.
//!
//! ## How it fits together
//!
//! ```text
//! ┌──────────────┐   configure / get_prices   ┌──────────────────┐   REST   ┌──────────┐
//! │  UI / CLI    │───────────────────────────▶│  CheckoutAdapter │────────▶│  Paddle  │
//! │  (signals)   │◀───── AdapterSnapshot ─────│  (lifecycle,     │◀────────│  Billing │
//! └──────────────┘        (watch)             │   price cache)   │         └──────────┘
//!                                             └──────────────────┘
//! ```
//!
//! The adapter only knows the [`BillingProvider`] / [`BillingClient`]
//! traits. [`PaddleProvider`] talks to the real API, [`MockBillingProvider`]
//! is a scriptable stand-in for tests and demos.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use paddle_checkout::{AdapterConfig, BillingCycle, CheckoutAdapter, PaddleProvider, ProductDetails};
//!
//! let config = Arc::new(AdapterConfig::from_env()?);
//! let adapter = CheckoutAdapter::start(PaddleProvider::new(), config).await;
//!
//! let catalog = vec![ProductDetails::new("pro", "pri_pro_monthly", "pri_pro_yearly")];
//! adapter.get_prices(&catalog, BillingCycle::Year).await?;
//!
//! // { "pro": "$96.00" }
//! println!("{:?}", adapter.product_prices());
//! ```

mod adapter;
mod config;
mod error;
pub mod mock;
mod model;
mod paddle;
mod pricing;
mod provider;

pub use adapter::{AdapterSnapshot, CheckoutAdapter, LifecycleState, PriceStatus};
pub use config::{AdapterConfig, CheckoutEvent, CheckoutSettings, Environment, EventCallback};
pub use error::{CheckoutError, Result};
pub use mock::{MockBillingClient, MockBillingProvider};
pub use model::{
    BillingCycle, CheckoutCustomer, CheckoutItem, CheckoutOptions, CustomerAddress, DisplayMode,
    DisplaySettings, FormattedTotals, LineItem, LineItemPrice, PricePreviewData,
    PricePreviewDetails, PricePreviewItem, PricePreviewRequest, PricePreviewResponse,
    ProductDetails, ProductPrices, Theme,
};
pub use paddle::{PaddleClient, PaddleProvider};
pub use pricing::{build_preview_request, reconcile_prices};
pub use provider::{BillingClient, BillingProvider};
