//! Post-checkout Landing Page

use leptos::prelude::*;

#[component]
pub fn WelcomePage() -> impl IntoView {
    view! {
        <div class="welcome">
            <h1>"Thanks for subscribing!"</h1>
            <p>"Your receipt is on its way to your inbox."</p>
            <a href="/pricing" class="btn">"Back to plans"</a>
        </div>
    }
}
