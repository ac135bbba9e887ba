use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// key: payment-models -> requests,responses,records

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
    Canceled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    OnHold,
    Failed,
    Canceled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zipcode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCustomer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Cart line item. `amount` is in minor currency units (cents).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductItem {
    pub product_id: String,
    pub amount: i64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentRequest {
    #[serde(default = "default_currency")]
    pub billing_currency: String,
    #[serde(default = "default_payment_methods")]
    pub allowed_payment_method_types: Vec<String>,
    pub product_cart: Vec<ProductItem>,
    pub return_url: String,
    #[serde(default)]
    pub customer: Option<PaymentCustomer>,
    #[serde(default)]
    pub billing: Option<BillingAddress>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_payment_methods() -> Vec<String> {
    vec!["credit".to_string(), "debit".to_string()]
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentResponse {
    pub id: String,
    pub url: String,
    pub checkout_url: Option<String>,
    pub status: String,
    pub expires_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub customer: PaymentCustomer,
    pub product_id: String,
    pub billing: BillingAddress,
    #[serde(default = "default_payment_link")]
    pub payment_link: bool,
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

fn default_payment_link() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionResponse {
    pub subscription_id: String,
    pub customer_id: String,
    pub status: String,
    pub product_id: String,
    pub payment_url: Option<String>,
}

/// Webhook envelope delivered by the payment processor. Transient: only its
/// effects on stored records are persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub business_id: String,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Map<String, Value>,
}

/// Stored record for a one-time payment, keyed by the processor-assigned
/// `payment_id`. The webhook path may mutate only `status`, `updated_at` and
/// `metadata` (replaced wholesale, not merged).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub payment_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub subscription_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub customer_id: String,
    pub product_id: String,
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub current_period_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub current_period_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    #[serde(default)]
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
