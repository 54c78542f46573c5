//! Pricing Catalog
//!
//! Tier copy lives here; price ids and the client token are baked in at
//! build time so the same WASM bundle never mixes sandbox and live ids.

use std::sync::Arc;

use paddle_checkout::{AdapterConfig, CheckoutEvent, Environment, ProductDetails};

use crate::proxy::ProxyProvider;

/// A tier shown on the pricing page
pub struct Tier {
    pub product_id: &'static str,
    pub name: &'static str,
    pub features: &'static [&'static str],
    monthly_price_id: Option<&'static str>,
    yearly_price_id: Option<&'static str>,
}

impl Tier {
    /// Catalog entry, if both price ids were configured
    pub fn details(&self) -> Option<ProductDetails> {
        match (self.monthly_price_id, self.yearly_price_id) {
            (Some(monthly), Some(yearly)) if !monthly.is_empty() && !yearly.is_empty() => {
                Some(ProductDetails::new(self.product_id, monthly, yearly))
            }
            _ => None,
        }
    }
}

pub const TIERS: &[Tier] = &[
    Tier {
        product_id: "starter",
        name: "Starter",
        features: &["1 workspace", "Email support"],
        monthly_price_id: option_env!("PADDLE_PRICE_STARTER_MONTH"),
        yearly_price_id: option_env!("PADDLE_PRICE_STARTER_YEAR"),
    },
    Tier {
        product_id: "pro",
        name: "Pro",
        features: &["Unlimited workspaces", "Priority support", "API access"],
        monthly_price_id: option_env!("PADDLE_PRICE_PRO_MONTH"),
        yearly_price_id: option_env!("PADDLE_PRICE_PRO_YEAR"),
    },
];

/// Products with configured price ids
pub fn products() -> Vec<ProductDetails> {
    TIERS.iter().filter_map(Tier::details).collect()
}

fn origin() -> String {
    web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_else(|| "http://localhost:3000".into())
}

/// Provider for the browser build
///
/// `PADDLE_API_BASE` names the same-origin proxy holding the API key. If it
/// was not set at build time the client never initializes.
pub fn provider() -> ProxyProvider {
    ProxyProvider::new(option_env!("PADDLE_API_BASE"), &origin())
}

/// Adapter config from build-time environment
pub fn adapter_config() -> Arc<AdapterConfig> {
    let environment = option_env!("PADDLE_ENVIRONMENT")
        .and_then(|env| env.parse().ok())
        .unwrap_or(Environment::Sandbox);
    let token = option_env!("PADDLE_CLIENT_TOKEN").unwrap_or_default();

    let config = AdapterConfig::new(environment, token)
        .with_success_url(format!("{}/welcome", origin()))
        .with_event_callback(|event| {
            if let CheckoutEvent::Opened {
                checkout_url: Some(url),
                ..
            } = event
            {
                if let Some(window) = web_sys::window() {
                    let _ = window.location().set_href(url);
                }
            }
        });

    Arc::new(config)
}
