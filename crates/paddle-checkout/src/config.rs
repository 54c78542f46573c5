//! Adapter Configuration

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{CheckoutError, Result};

/// Paddle environment the token belongs to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Sandbox,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Sandbox => "sandbox",
            Environment::Production => "production",
        }
    }

    /// Base URL of the Paddle Billing REST API
    pub fn api_base_url(&self) -> &'static str {
        match self {
            Environment::Sandbox => "https://sandbox-api.paddle.com",
            Environment::Production => "https://api.paddle.com",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = CheckoutError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sandbox" => Ok(Environment::Sandbox),
            "production" => Ok(Environment::Production),
            other => Err(CheckoutError::Config(format!(
                "unknown environment '{other}' (expected sandbox or production)"
            ))),
        }
    }
}

/// Checkout behaviour shared by every checkout the adapter opens
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSettings {
    /// Where the customer lands after a successful purchase
    #[serde(default)]
    pub success_url: Option<String>,
}

/// Event reported to the configured callback
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum CheckoutEvent {
    /// A checkout was created for the customer
    Opened {
        transaction_id: String,
        checkout_url: Option<String>,
    },

    /// The provider could not open checkout
    Failed { reason: String },
}

/// Callback receiving checkout events
pub type EventCallback = Arc<dyn Fn(&CheckoutEvent) + Send + Sync>;

/// Everything needed to initialize a billing client
#[derive(Clone)]
pub struct AdapterConfig {
    pub environment: Environment,
    pub token: String,
    pub event_callback: Option<EventCallback>,
    pub checkout_settings: Option<CheckoutSettings>,
}

impl AdapterConfig {
    pub fn new(environment: Environment, token: impl Into<String>) -> Self {
        Self {
            environment,
            token: token.into(),
            event_callback: None,
            checkout_settings: None,
        }
    }

    /// Create from environment variables
    ///
    /// `PADDLE_TOKEN` is required, `PADDLE_ENVIRONMENT` defaults to sandbox,
    /// `PADDLE_SUCCESS_URL` is optional.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("PADDLE_TOKEN")
            .map_err(|_| CheckoutError::Config("PADDLE_TOKEN not set".into()))?;
        let environment = match std::env::var("PADDLE_ENVIRONMENT") {
            Ok(value) => value.parse()?,
            Err(_) => Environment::default(),
        };

        let mut config = Self::new(environment, token);
        if let Ok(url) = std::env::var("PADDLE_SUCCESS_URL") {
            config = config.with_success_url(url);
        }
        Ok(config)
    }

    pub fn with_event_callback(
        mut self,
        callback: impl Fn(&CheckoutEvent) + Send + Sync + 'static,
    ) -> Self {
        self.event_callback = Some(Arc::new(callback));
        self
    }

    pub fn with_success_url(mut self, url: impl Into<String>) -> Self {
        self.checkout_settings
            .get_or_insert_with(CheckoutSettings::default)
            .success_url = Some(url.into());
        self
    }

    pub fn success_url(&self) -> Option<&str> {
        self.checkout_settings
            .as_ref()
            .and_then(|s| s.success_url.as_deref())
    }

    /// Deliver an event to the callback, if one is configured
    pub fn emit(&self, event: &CheckoutEvent) {
        if let Some(callback) = &self.event_callback {
            callback(event);
        }
    }
}

impl std::fmt::Debug for AdapterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterConfig")
            .field("environment", &self.environment)
            .field("token", &"<redacted>")
            .field("event_callback", &self.event_callback.is_some())
            .field("checkout_settings", &self.checkout_settings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_environment_urls() {
        assert_eq!(
            Environment::Sandbox.api_base_url(),
            "https://sandbox-api.paddle.com"
        );
        assert_eq!(
            "Production".parse::<Environment>().unwrap().api_base_url(),
            "https://api.paddle.com"
        );
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = AdapterConfig::new(Environment::Sandbox, "test_secret_token");
        let printed = format!("{config:?}");
        assert!(!printed.contains("test_secret_token"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_success_url_and_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let config = AdapterConfig::new(Environment::Sandbox, "test_abc")
            .with_success_url("https://example.com/thanks")
            .with_event_callback(move |event| sink.lock().unwrap().push(event.clone()));

        assert_eq!(config.success_url(), Some("https://example.com/thanks"));

        config.emit(&CheckoutEvent::Failed {
            reason: "boom".into(),
        });
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_event_serialization() {
        let event = CheckoutEvent::Opened {
            transaction_id: "txn_1".into(),
            checkout_url: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["name"], "opened");
        assert_eq!(json["transaction_id"], "txn_1");
    }
}
