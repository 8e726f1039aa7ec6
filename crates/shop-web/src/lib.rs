//! Storefront Web Frontend
//!
//! Leptos-based WASM frontend: onboarding wizard and checkout pages.

mod app;
mod pages;
mod components;
mod api;
pub mod wizard;

pub use app::App;
pub use wizard::{TOTAL_STEPS, WizardState};

use wasm_bindgen::prelude::*;

/// WASM entry point
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    leptos::mount::mount_to_body(App);
}
