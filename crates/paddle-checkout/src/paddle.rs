//! Paddle Billing REST Provider
//!
//! Implements [`BillingProvider`] against the Paddle Billing API:
//!
//! - price previews go to `POST /pricing-preview`
//! - checkouts create a transaction (`POST /transactions`) and report the
//!   hosted checkout URL through the configured event callback

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::{AdapterConfig, CheckoutEvent, Environment};
use crate::error::{CheckoutError, Result};
use crate::model::{CheckoutOptions, PricePreviewRequest, PricePreviewResponse};
use crate::provider::{BillingClient, BillingProvider};

const API_VERSION: &str = "1";

/// Provider creating [`PaddleClient`]s
#[derive(Clone, Debug, Default)]
pub struct PaddleProvider {
    http: reqwest::Client,
    base_url: Option<String>,
}

impl PaddleProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send requests to `base_url` instead of the environment's API host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Reuse an existing HTTP client (connection pool, proxies, timeouts)
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    fn base_url_for(&self, environment: Environment) -> String {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| environment.api_base_url())
            .trim_end_matches('/')
            .to_string()
    }
}

/// Reject empty tokens and tokens that belong to the other environment
fn check_token(config: &AdapterConfig) -> Result<()> {
    let token = config.token.trim();
    if token.is_empty() {
        return Err(CheckoutError::Initialization("token is empty".into()));
    }

    let live = token.starts_with("live_") || token.starts_with("pdl_live_");
    let sandbox = token.starts_with("test_") || token.starts_with("pdl_sdbx_");

    match config.environment {
        Environment::Sandbox if live => Err(CheckoutError::Initialization(
            "live token used with the sandbox environment".into(),
        )),
        Environment::Production if sandbox => Err(CheckoutError::Initialization(
            "sandbox token used with the production environment".into(),
        )),
        _ => Ok(()),
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl BillingProvider for PaddleProvider {
    type Client = PaddleClient;

    async fn initialize(&self, config: &AdapterConfig) -> Result<PaddleClient> {
        check_token(config)?;

        Ok(PaddleClient {
            http: self.http.clone(),
            base_url: self.base_url_for(config.environment),
            config: config.clone(),
        })
    }

    fn name(&self) -> &str {
        "Paddle"
    }
}

/// Initialized Paddle API client
pub struct PaddleClient {
    http: reqwest::Client,
    base_url: String,
    config: AdapterConfig,
}

impl PaddleClient {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(self.config.token.trim())
            .header("Paddle-Version", API_VERSION)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(api_error(status.as_u16(), &body))
        }
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    code: Option<String>,
    detail: String,
}

/// Turn a non-2xx response body into [`CheckoutError::Api`]
fn api_error(status: u16, body: &str) -> CheckoutError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => CheckoutError::Api {
            status,
            code: envelope.error.code,
            message: envelope.error.detail,
        },
        Err(_) => CheckoutError::Api {
            status,
            code: None,
            message: if body.trim().is_empty() {
                "empty response body".into()
            } else {
                body.trim().to_string()
            },
        },
    }
}

#[derive(Serialize)]
struct TransactionRequest<'a> {
    items: Vec<TransactionItem<'a>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    custom_data: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct TransactionItem<'a> {
    price_id: &'a str,
    quantity: u32,
}

impl<'a> TransactionRequest<'a> {
    fn new(options: &'a CheckoutOptions, success_url: Option<&str>) -> Self {
        Self {
            items: options
                .items
                .iter()
                .map(|item| TransactionItem {
                    price_id: &item.price_id,
                    quantity: item.quantity.unwrap_or(1),
                })
                .collect(),
            custom_data: success_url.map(|url| serde_json::json!({ "success_url": url })),
        }
    }
}

#[derive(Deserialize)]
struct TransactionEnvelope {
    data: Transaction,
}

#[derive(Deserialize)]
struct Transaction {
    id: String,
    #[serde(default)]
    checkout: Option<TransactionCheckout>,
}

#[derive(Deserialize)]
struct TransactionCheckout {
    url: Option<String>,
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl BillingClient for PaddleClient {
    async fn open_checkout(&self, options: &CheckoutOptions) -> Result<()> {
        if options.customer.is_some() || options.settings.is_some() {
            tracing::debug!("Customer prefill and display settings only apply to client-rendered checkout");
        }

        let body = TransactionRequest::new(options, self.config.success_url());
        match self
            .post::<_, TransactionEnvelope>("/transactions", &body)
            .await
        {
            Ok(envelope) => {
                let checkout_url = envelope.data.checkout.and_then(|c| c.url);
                tracing::info!(
                    transaction_id = %envelope.data.id,
                    has_checkout_url = checkout_url.is_some(),
                    "Created checkout transaction"
                );
                self.config.emit(&CheckoutEvent::Opened {
                    transaction_id: envelope.data.id,
                    checkout_url,
                });
                Ok(())
            }
            Err(e) => {
                self.config.emit(&CheckoutEvent::Failed {
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn preview_prices(&self, request: &PricePreviewRequest) -> Result<PricePreviewResponse> {
        let response: PricePreviewResponse = self.post("/pricing-preview", request).await?;
        tracing::debug!(
            line_items = response.line_items().len(),
            "Received price preview"
        );
        Ok(response)
    }
}
