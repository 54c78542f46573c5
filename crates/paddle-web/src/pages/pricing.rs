//! Pricing Page

use leptos::prelude::*;
use paddle_checkout::{BillingCycle, CheckoutOptions, LifecycleState, PriceStatus};

use crate::catalog::{self, Tier};
use crate::hook::{use_checkout, CheckoutHandle};
use crate::proxy::ProxyProvider;

#[component]
pub fn PricingPage() -> impl IntoView {
    let config = catalog::adapter_config();
    let checkout = use_checkout(catalog::provider(), Signal::derive(move || config.clone()));

    // Fetch as soon as the client is ready (and again after re-initialization)
    Effect::new(move |_| {
        if checkout.is_ready() {
            checkout.get_prices(catalog::products(), checkout.billing_cycle.get_untracked());
        }
    });

    let toggle = move |_| {
        let cycle = checkout.billing_cycle.get_untracked().toggled();
        checkout.get_prices(catalog::products(), cycle);
    };

    view! {
        <div class="pricing">
            <h1>"Pricing"</h1>
            <div class="cycle-toggle">
                <button class="btn" on:click=toggle>
                    {move || match checkout.billing_cycle.get() {
                        BillingCycle::Month => "Switch to yearly billing",
                        BillingCycle::Year => "Switch to monthly billing",
                    }}
                </button>
            </div>

            {move || {
                matches!(checkout.lifecycle.get(), LifecycleState::Failed(_))
                    .then(|| view! { <p class="error">"Checkout is unavailable right now."</p> })
            }}

            <div class="plans">
                {catalog::TIERS
                    .iter()
                    .map(|tier| view! { <PlanCard tier=tier checkout=checkout /> })
                    .collect_view()}
            </div>
        </div>
    }
}

#[component]
fn PlanCard(tier: &'static Tier, checkout: CheckoutHandle<ProxyProvider>) -> impl IntoView {
    let product_id = tier.product_id;
    let details = tier.details();
    let available = details.is_some();

    let price = move || match (checkout.price_for(product_id), checkout.price_status.get()) {
        (Some(price), _) => price,
        (None, PriceStatus::Loading) => "...".to_string(),
        (None, PriceStatus::Error(_)) => "Unavailable".to_string(),
        (None, _) => "-".to_string(),
    };
    let per = move || format!("/{}", checkout.billing_cycle.get());

    let subscribe = move |_| {
        if let Some(details) = &details {
            let price_id = details.price_id(checkout.billing_cycle.get_untracked());
            checkout.open_checkout(CheckoutOptions::for_price(price_id));
        }
    };

    view! {
        <div class="plan">
            <h2>{tier.name}</h2>
            <div class="price">{price}<span>{per}</span></div>
            <ul>
                {tier.features.iter().map(|feature| view! { <li>{*feature}</li> }).collect_view()}
            </ul>
            <button
                class="btn btn-primary"
                disabled=move || !available || !checkout.is_ready()
                on:click=subscribe
            >
                "Subscribe"
            </button>
        </div>
    }
}
