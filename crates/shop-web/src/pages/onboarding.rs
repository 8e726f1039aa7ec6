//! Onboarding Page

use leptos::prelude::*;

use crate::components::OnboardingWizard;

#[component]
pub fn OnboardingPage() -> impl IntoView {
    view! {
        <div class="onboarding">
            <OnboardingWizard />
        </div>
    }
}
