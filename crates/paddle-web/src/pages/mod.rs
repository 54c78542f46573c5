//! Page Components

mod pricing;
mod welcome;

pub use pricing::PricingPage;
pub use welcome::WelcomePage;
