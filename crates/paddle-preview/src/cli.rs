use clap::Parser;
use paddle_checkout::{BillingCycle, Environment, ProductDetails};

#[derive(Parser, Debug)]
#[command(name = "paddle-preview")]
#[command(version, about = "Preview localized Paddle prices for a product catalog")]
pub struct Cli {
    /// Products as PRODUCT=MONTHLY_PRICE_ID:YEARLY_PRICE_ID
    #[arg(required = true, value_name = "PRODUCT", value_parser = parse_product)]
    pub products: Vec<ProductDetails>,

    /// Billing cycle to price (month or year)
    #[arg(short = 'c', long, default_value = "year")]
    pub cycle: BillingCycle,

    /// Override PADDLE_ENVIRONMENT (sandbox or production)
    #[arg(short = 'e', long)]
    pub environment: Option<Environment>,

    /// Send API requests to this base URL instead of Paddle's
    #[arg(long, value_name = "URL")]
    pub api_base: Option<String>,

    /// Print the full adapter snapshot as JSON
    #[arg(long)]
    pub json: bool,
}

/// Parse `PRODUCT=MONTHLY:YEARLY`
fn parse_product(value: &str) -> Result<ProductDetails, String> {
    let (product_id, prices) = value
        .split_once('=')
        .ok_or_else(|| format!("expected PRODUCT=MONTHLY:YEARLY, got '{value}'"))?;
    let (monthly, yearly) = prices
        .split_once(':')
        .ok_or_else(|| format!("expected MONTHLY:YEARLY price ids, got '{prices}'"))?;

    let (product_id, monthly, yearly) = (product_id.trim(), monthly.trim(), yearly.trim());
    if product_id.is_empty() || monthly.is_empty() || yearly.is_empty() {
        return Err(format!("empty product or price id in '{value}'"));
    }

    Ok(ProductDetails::new(product_id, monthly, yearly))
}
