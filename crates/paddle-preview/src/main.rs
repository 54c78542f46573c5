//! Paddle Price Preview CLI
//!
//! Initializes the checkout adapter from the environment and prints the
//! localized price of every product for one billing cycle.

mod cli;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paddle_checkout::{AdapterConfig, CheckoutAdapter, LifecycleState, PaddleProvider};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = AdapterConfig::from_env()?;
    if let Some(environment) = cli.environment {
        config.environment = environment;
    }

    let provider = match &cli.api_base {
        Some(base) => PaddleProvider::new().with_base_url(base),
        None => PaddleProvider::new(),
    };

    tracing::info!(
        environment = %config.environment,
        cycle = %cli.cycle,
        products = cli.products.len(),
        "Fetching price preview"
    );

    let adapter = CheckoutAdapter::start(provider, Arc::new(config)).await;
    if let LifecycleState::Failed(reason) = adapter.lifecycle() {
        anyhow::bail!("billing client initialization failed: {reason}");
    }

    let prices = adapter.get_prices(&cli.products, cli.cycle).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&adapter.snapshot())?);
        return Ok(());
    }

    for product in &cli.products {
        match prices.get(&product.product_id) {
            Some(price) => println!("{}\t{}", product.product_id, price),
            None => println!("{}\t(no price)", product.product_id),
        }
    }

    Ok(())
}
