//! API Client

use serde::{Deserialize, Serialize};

/// Product offered on the checkout page
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub title: String,
    pub amount_cents: i64,
    pub currency: String,
}

impl Product {
    /// "$19.00"-style price for display
    pub fn display_price(&self) -> String {
        let symbol = match self.currency.to_ascii_lowercase().as_str() {
            "usd" => "$",
            "eur" => "€",
            "gbp" => "£",
            _ => "",
        };
        format!(
            "{symbol}{}.{:02} {}",
            self.amount_cents / 100,
            self.amount_cents % 100,
            self.currency.to_ascii_uppercase()
        )
    }
}

/// Create a Stripe checkout session and return the hosted page URL
pub async fn create_checkout(product: &Product) -> Result<String, String> {
    let client = reqwest::Client::new();

    let origin = web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_else(|| "http://localhost:3000".into());

    let body = serde_json::json!({ "product": product });

    let response = client
        .post(format!("{origin}/api/checkout"))
        .json(&body)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let ok = response.status().is_success();
    let data: serde_json::Value = response.json().await.unwrap_or_default();

    if ok {
        data["url"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| "No checkout URL returned".to_string())
    } else {
        Err(data["error"].as_str().unwrap_or("Failed to create checkout").to_string())
    }
}
