//! Checkout return pages

use leptos::prelude::*;
use leptos_router::hooks::use_query_map;

/// Shown after a successful payment; no receipt email is sent yet
const SUCCESS_MESSAGE: &str = "Your payment went through.";

/// Stripe redirects here after payment with `?session_id=cs_...`
#[component]
pub fn SuccessPage() -> impl IntoView {
    let query = use_query_map();
    let session_id = move || {
        query.with(|q| q.get("session_id").map(|s| s.to_string()).unwrap_or_default())
    };

    view! {
        <div class="result success">
            <h1>"Thank you!"</h1>
            <p>{SUCCESS_MESSAGE}</p>
            <p class="muted">"Reference: " {session_id}</p>
            <a href="/" class="btn">"Back to start"</a>
        </div>
    }
}

/// Stripe redirects here when the buyer abandons checkout
#[component]
pub fn CancelPage() -> impl IntoView {
    view! {
        <div class="result cancel">
            <h1>"Checkout cancelled"</h1>
            <p>"No payment was taken."</p>
            <a href="/checkout" class="btn btn-primary">"Back to products"</a>
        </div>
    }
}
