//! Page Components

mod onboarding;
mod checkout;
mod result;

pub use onboarding::OnboardingPage;
pub use checkout::CheckoutPage;
pub use result::{CancelPage, SuccessPage};
