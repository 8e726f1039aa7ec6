//! Checkout Page

use leptos::prelude::*;

use crate::api::{self, Product};

fn catalog() -> Vec<Product> {
    vec![
        Product {
            id: "ebook-rust-patterns".into(),
            title: "Rust Patterns eBook".into(),
            amount_cents: 1900,
            currency: "usd".into(),
        },
        Product {
            id: "course-async-rust".into(),
            title: "Async Rust Video Course".into(),
            amount_cents: 4900,
            currency: "usd".into(),
        },
    ]
}

#[component]
pub fn CheckoutPage() -> impl IntoView {
    let (error, set_error) = signal(None::<String>);
    let (loading, set_loading) = signal(false);

    let buy = move |product: Product| {
        if loading.get() {
            return;
        }
        set_loading.set(true);
        set_error.set(None);

        leptos::task::spawn_local(async move {
            match api::create_checkout(&product).await {
                Ok(url) => {
                    if let Some(window) = web_sys::window() {
                        let _ = window.location().set_href(&url);
                    }
                }
                Err(e) => {
                    set_error.set(Some(e));
                    set_loading.set(false);
                }
            }
        });
    };

    view! {
        <div class="checkout">
            <h1>"Products"</h1>
            <Show when=move || error.get().is_some()>
                <p class="error">{move || error.get().unwrap_or_default()}</p>
            </Show>

            <div class="products">
                {catalog()
                    .into_iter()
                    .map(|product| {
                        let price = product.display_price();
                        let title = product.title.clone();
                        view! {
                            <div class="product">
                                <h2>{title}</h2>
                                <div class="price">{price}</div>
                                <button
                                    class="btn btn-primary"
                                    disabled=move || loading.get()
                                    on:click=move |_| buy(product.clone())
                                >
                                    {move || if loading.get() { "Redirecting..." } else { "Buy now" }}
                                </button>
                            </div>
                        }
                    })
                    .collect_view()}
            </div>
        </div>
    }
}
