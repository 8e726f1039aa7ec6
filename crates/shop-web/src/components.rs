//! UI Components

use leptos::prelude::*;

use crate::wizard::WizardState;

/// Three-step onboarding wizard
#[component]
pub fn OnboardingWizard() -> impl IntoView {
    let (state, set_state) = signal(WizardState::new());

    view! {
        <div class="wizard">
            <h1>"Onboarding Wizard"</h1>
            <p class="wizard-step">{move || state.get().label()}</p>
            <Show
                when=move || !state.get().is_complete()
                fallback=|| view! {
                    <p class="wizard-done">"You're all set."</p>
                    <a href="/checkout" class="btn btn-primary">"Browse products"</a>
                }
            >
                <button class="btn btn-primary" on:click=move |_| set_state.update(|s| *s = s.advance())>
                    {move || if state.get().is_last_step() { "Finish" } else { "Next" }}
                </button>
            </Show>
        </div>
    }
}
