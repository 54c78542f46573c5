//! Pricing Web Frontend
//!
//! Leptos-based WASM frontend: a reactive checkout hook over
//! `paddle-checkout` and the pricing page built on it.

mod app;
mod catalog;
mod hook;
mod pages;
mod proxy;

pub use app::App;
pub use hook::{use_checkout, CheckoutHandle};
pub use proxy::ProxyProvider;

use wasm_bindgen::prelude::*;

/// WASM entry point
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
    leptos::mount::mount_to_body(App);
}
