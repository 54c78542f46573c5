//! Catalog, Checkout, and Price Preview Types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::CheckoutError;

/// Recurrence period used to pick a product's price id
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Month,
    #[default]
    Year,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Month => "month",
            BillingCycle::Year => "year",
        }
    }

    /// The other cycle (for month/year toggles)
    pub fn toggled(self) -> Self {
        match self {
            BillingCycle::Month => BillingCycle::Year,
            BillingCycle::Year => BillingCycle::Month,
        }
    }
}

impl std::fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingCycle {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "month" | "monthly" => Ok(BillingCycle::Month),
            "year" | "yearly" => Ok(BillingCycle::Year),
            other => Err(CheckoutError::Config(format!(
                "unknown billing cycle '{other}' (expected month or year)"
            ))),
        }
    }
}

/// A catalog entry: one product tier with its monthly and yearly prices
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetails {
    pub product_id: String,
    pub monthly_price_id: String,
    pub yearly_price_id: String,
}

impl ProductDetails {
    pub fn new(
        product_id: impl Into<String>,
        monthly_price_id: impl Into<String>,
        yearly_price_id: impl Into<String>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            monthly_price_id: monthly_price_id.into(),
            yearly_price_id: yearly_price_id.into(),
        }
    }

    /// Price id that applies under `cycle`
    pub fn price_id(&self, cycle: BillingCycle) -> &str {
        match cycle {
            BillingCycle::Month => &self.monthly_price_id,
            BillingCycle::Year => &self.yearly_price_id,
        }
    }

    /// Whether either of this product's price ids equals `price_id`
    pub fn matches_price(&self, price_id: &str) -> bool {
        self.monthly_price_id == price_id || self.yearly_price_id == price_id
    }
}

/// Formatted price per product id
pub type ProductPrices = HashMap<String, String>;

// ---------------------------------------------------------------------------
// Checkout request
// ---------------------------------------------------------------------------

/// One item to put in the checkout
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutItem {
    pub price_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

impl CheckoutItem {
    pub fn new(price_id: impl Into<String>) -> Self {
        Self {
            price_id: price_id.into(),
            quantity: None,
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }
}

/// Customer address used to prefill checkout
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerAddress {
    pub country_code: String,
    pub postal_code: String,
    pub region: String,
    pub city: String,
    pub first_line: String,
}

/// Customer prefill
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutCustomer {
    pub email: String,
    pub address: CustomerAddress,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Overlay,
    Inline,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

/// How a client-rendered checkout should look
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_mode: Option<DisplayMode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

/// Request to open checkout
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutOptions {
    pub items: Vec<CheckoutItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<CheckoutCustomer>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<DisplaySettings>,
}

impl CheckoutOptions {
    /// Checkout for a single price, quantity left to the provider default
    pub fn for_price(price_id: impl Into<String>) -> Self {
        Self {
            items: vec![CheckoutItem::new(price_id)],
            ..Default::default()
        }
    }

    pub fn with_customer(mut self, customer: CheckoutCustomer) -> Self {
        self.customer = Some(customer);
        self
    }

    pub fn with_settings(mut self, settings: DisplaySettings) -> Self {
        self.settings = Some(settings);
        self
    }
}

// ---------------------------------------------------------------------------
// Price preview wire format
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePreviewItem {
    pub price_id: String,
    pub quantity: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePreviewRequest {
    pub items: Vec<PricePreviewItem>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePreviewResponse {
    pub data: PricePreviewData,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePreviewData {
    pub details: PricePreviewDetails,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePreviewDetails {
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

/// One priced entry of a preview response
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub price: LineItemPrice,
    pub formatted_totals: FormattedTotals,
}

impl LineItem {
    pub fn new(price_id: impl Into<String>, subtotal: impl Into<String>) -> Self {
        Self {
            price: LineItemPrice { id: price_id.into() },
            formatted_totals: FormattedTotals {
                subtotal: subtotal.into(),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemPrice {
    pub id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedTotals {
    pub subtotal: String,
}

impl PricePreviewResponse {
    pub fn from_line_items(line_items: Vec<LineItem>) -> Self {
        Self {
            data: PricePreviewData {
                details: PricePreviewDetails { line_items },
            },
        }
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.data.details.line_items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_billing_cycle_parsing() {
        assert_eq!("Month".parse::<BillingCycle>().unwrap(), BillingCycle::Month);
        assert_eq!("yearly".parse::<BillingCycle>().unwrap(), BillingCycle::Year);
        assert!("weekly".parse::<BillingCycle>().is_err());
        assert_eq!(BillingCycle::default(), BillingCycle::Year);
        assert_eq!(BillingCycle::Month.toggled(), BillingCycle::Year);
    }

    #[test]
    fn test_product_price_selection() {
        let pro = ProductDetails::new("pro", "pri_m", "pri_y");
        assert_eq!(pro.price_id(BillingCycle::Month), "pri_m");
        assert_eq!(pro.price_id(BillingCycle::Year), "pri_y");
        assert!(pro.matches_price("pri_m"));
        assert!(pro.matches_price("pri_y"));
        assert!(!pro.matches_price("pri_other"));
    }

    #[test]
    fn test_preview_response_ignores_unknown_fields() {
        let body = r#"{
            "data": {
                "currency_code": "EUR",
                "details": {
                    "line_items": [{
                        "price": { "id": "pri_y", "description": "Yearly" },
                        "quantity": 1,
                        "formatted_totals": { "subtotal": "€96.00", "total": "€114.24" }
                    }]
                }
            },
            "meta": { "request_id": "abc" }
        }"#;

        let response: PricePreviewResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.line_items().len(), 1);
        assert_eq!(response.line_items()[0].price.id, "pri_y");
        assert_eq!(response.line_items()[0].formatted_totals.subtotal, "€96.00");
    }

    #[test]
    fn test_checkout_options_skip_empty_fields() {
        let options = CheckoutOptions::for_price("pri_m");
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json, serde_json::json!({ "items": [{ "price_id": "pri_m" }] }));
    }
}
