//! Same-Origin Proxy Provider
//!
//! The browser never talks to the Paddle API directly: the REST API rejects
//! client-side tokens and cross-origin requests. Every request goes to a
//! proxy on the page's origin that attaches the API key server-side.

use async_trait::async_trait;
use paddle_checkout::{
    AdapterConfig, BillingProvider, CheckoutError, PaddleClient, PaddleProvider, Result,
};

const MISSING_BASE: &str =
    "PADDLE_API_BASE is not set; the browser build needs a same-origin billing proxy";

/// [`PaddleProvider`] pinned to a proxy base URL
///
/// Without a base URL every initialization fails, which leaves the adapter
/// `Failed` with the reason instead of sending the token to the public API.
#[derive(Clone, Debug)]
pub struct ProxyProvider {
    inner: std::result::Result<PaddleProvider, &'static str>,
}

impl ProxyProvider {
    /// `api_base` may be absolute or a path resolved against `origin`
    pub fn new(api_base: Option<&str>, origin: &str) -> Self {
        let inner = match api_base.map(str::trim) {
            Some(base) if base.starts_with('/') => Ok(PaddleProvider::new()
                .with_base_url(format!("{}{}", origin.trim_end_matches('/'), base))),
            Some(base) if !base.is_empty() => Ok(PaddleProvider::new().with_base_url(base)),
            _ => Err(MISSING_BASE),
        };
        Self { inner }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl BillingProvider for ProxyProvider {
    type Client = PaddleClient;

    async fn initialize(&self, config: &AdapterConfig) -> Result<PaddleClient> {
        match &self.inner {
            Ok(provider) => provider.initialize(config).await,
            Err(reason) => Err(CheckoutError::Initialization((*reason).to_string())),
        }
    }

    fn name(&self) -> &str {
        "Paddle (proxy)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paddle_checkout::{CheckoutAdapter, Environment, LifecycleState};
    use std::sync::Arc;

    fn config() -> AdapterConfig {
        AdapterConfig::new(Environment::Sandbox, "test_client_token")
    }

    #[tokio::test]
    async fn test_relative_base_uses_page_origin() {
        let provider = ProxyProvider::new(Some("/api/paddle"), "https://shop.example.com/");
        let client = provider.initialize(&config()).await.unwrap();
        assert_eq!(client.base_url(), "https://shop.example.com/api/paddle");
    }

    #[tokio::test]
    async fn test_absolute_base_is_kept() {
        let provider = ProxyProvider::new(Some("https://billing.example.com/v1/"), "https://shop.example.com");
        let client = provider.initialize(&config()).await.unwrap();
        assert_eq!(client.base_url(), "https://billing.example.com/v1");
    }

    #[tokio::test]
    async fn test_missing_base_fails_initialization() {
        for base in [None, Some(""), Some("   ")] {
            let provider = ProxyProvider::new(base, "https://shop.example.com");
            let result = provider.initialize(&config()).await;
            assert!(matches!(result, Err(CheckoutError::Initialization(reason)) if reason.contains("PADDLE_API_BASE")));
        }
    }

    #[tokio::test]
    async fn test_adapter_reports_missing_base() {
        let provider = ProxyProvider::new(None, "https://shop.example.com");
        let adapter = CheckoutAdapter::start(provider, Arc::new(config())).await;

        assert!(matches!(adapter.lifecycle(), LifecycleState::Failed(reason) if reason.contains("same-origin")));
        assert!(adapter.client().is_none());
    }
}
