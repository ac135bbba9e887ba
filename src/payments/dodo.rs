use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;

use super::models::{CreatePaymentRequest, CreateSubscriptionRequest};

/// Thin client for the Dodo Payments REST API.
#[derive(Clone)]
pub struct DodoClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// Checkout session returned by `POST /payments`.
#[derive(Debug, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub checkout_url: Option<String>,
    pub status: String,
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// Subscription session returned by `POST /subscriptions`.
#[derive(Debug, Deserialize)]
pub struct SubscriptionSession {
    pub subscription_id: String,
    pub status: String,
    #[serde(default)]
    pub payment_url: Option<String>,
}

impl DodoClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build payment processor client")?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    pub fn api_key_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn endpoint(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    pub async fn create_payment(&self, request: &CreatePaymentRequest) -> Result<CheckoutSession> {
        let mut payload = json!({
            "billing_currency": request.billing_currency,
            "allowed_payment_method_types": request.allowed_payment_method_types,
            "product_cart": request.product_cart,
            "return_url": request.return_url,
            "payment_link": true,
            "metadata": request.metadata.clone().unwrap_or_else(|| json!({})),
        });
        if let Some(customer) = &request.customer {
            payload["customer"] = serde_json::to_value(customer)?;
        }
        if let Some(billing) = &request.billing {
            payload["billing"] = serde_json::to_value(billing)?;
        }

        let response = self
            .client
            .post(self.endpoint("payments"))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .context("failed to reach payment processor")?
            .error_for_status()
            .context("payment processor rejected checkout request")?;

        response
            .json()
            .await
            .context("failed to decode checkout session response")
    }

    pub async fn create_subscription(
        &self,
        request: &CreateSubscriptionRequest,
    ) -> Result<SubscriptionSession> {
        let mut payload = json!({
            "customer": request.customer,
            "product_id": request.product_id,
            "billing": request.billing,
            "payment_link": request.payment_link,
            "metadata": request.metadata.clone().unwrap_or_else(|| json!({})),
        });
        if let Some(subscription_id) = &request.subscription_id {
            payload["subscription_id"] = json!(subscription_id);
        }

        let response = self
            .client
            .post(self.endpoint("subscriptions"))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .context("failed to reach payment processor")?
            .error_for_status()
            .context("payment processor rejected subscription request")?;

        response
            .json()
            .await
            .context("failed to decode subscription session response")
    }
}
