//! Checkout Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, CheckoutError>;

/// Checkout and pricing errors
#[derive(Error, Debug)]
pub enum CheckoutError {
    /// Billing client setup was rejected
    #[error("Billing client initialization failed: {0}")]
    Initialization(String),

    /// Checkout or price operation attempted before initialization succeeded
    #[error("Billing client not initialized")]
    NotReady,

    /// Price preview call was rejected
    #[error("Price preview failed: {0}")]
    PricePreview(String),

    /// Checkout could not be opened
    #[error("Checkout failed: {0}")]
    Checkout(String),

    /// A newer request was issued before this one resolved
    #[error("Request {request_id} superseded by request {latest}")]
    Superseded { request_id: u64, latest: u64 },

    /// Billing API returned an error envelope
    #[error("Billing API error ({status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Payload could not be (de)serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CheckoutError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            CheckoutError::Http(_) => true,
            CheckoutError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> &str {
        match self {
            CheckoutError::NotReady | CheckoutError::Initialization(_) => {
                "Checkout is not available right now."
            }
            CheckoutError::PricePreview(_) => "Prices could not be loaded. Please try again.",
            CheckoutError::Checkout(_) => "Checkout could not be opened. Please try again.",
            CheckoutError::Config(_) => "Service configuration error.",
            _ => "An error occurred processing your request.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_api_errors() {
        let throttled = CheckoutError::Api {
            status: 429,
            code: Some("too_many_requests".into()),
            message: "slow down".into(),
        };
        let invalid = CheckoutError::Api {
            status: 400,
            code: Some("bad_request".into()),
            message: "invalid price id".into(),
        };

        assert!(throttled.is_retryable());
        assert!(!invalid.is_retryable());
        assert!(!CheckoutError::NotReady.is_retryable());
    }

    #[test]
    fn test_user_message_hides_details() {
        let err = CheckoutError::PricePreview("upstream said no: pri_123".into());
        assert!(!err.user_message().contains("pri_123"));
        assert_eq!(
            CheckoutError::NotReady.user_message(),
            "Checkout is not available right now."
        );
    }
}
