use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use crate::config::PaymentsMode;
use crate::error::{AppError, AppResult};

use super::dodo::DodoClient;
use super::models::{
    CreatePaymentRequest, CreateSubscriptionRequest, PaymentRecord, PaymentResponse,
    PaymentStatus, SubscriptionRecord, SubscriptionResponse, SubscriptionStatus,
};
use super::store::RecordStore;

// key: payments-service -> checkout-lifecycle,mock-fallback

/// Owns the store handle and processor client; constructed once in `main`
/// and injected into handlers as an `Extension`.
#[derive(Clone)]
pub struct PaymentsService {
    store: Arc<dyn RecordStore>,
    gateway: Arc<DodoClient>,
    mode: PaymentsMode,
    webhook_secret: Option<String>,
}

impl PaymentsService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        gateway: DodoClient,
        mode: PaymentsMode,
        webhook_secret: Option<String>,
    ) -> Self {
        Self {
            store,
            gateway: Arc::new(gateway),
            mode,
            webhook_secret,
        }
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub fn mode(&self) -> PaymentsMode {
        self.mode
    }

    pub fn webhook_secret(&self) -> Option<&str> {
        self.webhook_secret.as_deref()
    }

    pub fn api_key_configured(&self) -> bool {
        self.gateway.api_key_configured()
    }

    /// Creates a processor-hosted checkout session and records the pending
    /// payment. On upstream failure in test mode, a synthesized mock session
    /// is returned instead (and nothing is recorded).
    pub async fn create_payment(
        &self,
        request: CreatePaymentRequest,
        user_id: Option<String>,
    ) -> AppResult<PaymentResponse> {
        match self.gateway.create_payment(&request).await {
            Ok(session) => {
                let now = Utc::now();
                let record = PaymentRecord {
                    id: session.id.clone(),
                    payment_id: session.id.clone(),
                    user_id,
                    customer_id: request
                        .customer
                        .as_ref()
                        .and_then(|customer| customer.customer_id.clone()),
                    amount: request.product_cart.iter().map(|item| item.amount).sum(),
                    currency: request.billing_currency.clone(),
                    status: PaymentStatus::Pending,
                    product_id: request
                        .product_cart
                        .first()
                        .map(|item| item.product_id.clone()),
                    metadata: request.metadata.clone(),
                    created_at: now,
                    updated_at: now,
                };
                self.store.insert_payment(&record).await.map_err(|error| {
                    AppError::Message(format!("failed to persist payment record: {error:#}"))
                })?;

                Ok(PaymentResponse {
                    id: session.id,
                    // checkout_url is never null in the response: absent or
                    // null in the session falls back to the session url.
                    checkout_url: session
                        .checkout_url
                        .clone()
                        .or_else(|| Some(session.url.clone())),
                    url: session.url,
                    status: session.status,
                    expires_at: session.expires_at,
                })
            }
            Err(error) if self.mode.is_test() => {
                warn!(
                    ?error,
                    "payment processor call failed; returning mock checkout response (test mode)"
                );
                let mock_id = format!("mock_payment_{}", Utc::now().timestamp());
                Ok(PaymentResponse {
                    url: format!("https://checkout.dodopayments.com/mock/{mock_id}"),
                    id: mock_id,
                    checkout_url: None,
                    status: "pending".to_string(),
                    expires_at: Some(Utc::now().to_rfc3339()),
                })
            }
            Err(error) => Err(AppError::Upstream(format!("{error:#}"))),
        }
    }

    /// Creates a recurring subscription with the processor and records it.
    /// Same test-mode mock fallback as `create_payment`.
    pub async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
        user_id: Option<String>,
    ) -> AppResult<SubscriptionResponse> {
        match self.gateway.create_subscription(&request).await {
            Ok(session) => {
                let now = Utc::now();
                // Records are keyed by the processor ids; a customer without
                // one yet is stored with an empty customer_id.
                let customer_id = request.customer.customer_id.clone().unwrap_or_default();
                let record = SubscriptionRecord {
                    id: session.subscription_id.clone(),
                    subscription_id: session.subscription_id.clone(),
                    user_id,
                    customer_id: customer_id.clone(),
                    product_id: request.product_id.clone(),
                    status: SubscriptionStatus::Active,
                    current_period_start: None,
                    current_period_end: None,
                    cancel_at_period_end: false,
                    metadata: request.metadata.clone(),
                    created_at: now,
                    updated_at: now,
                };
                self.store
                    .insert_subscription(&record)
                    .await
                    .map_err(|error| {
                        AppError::Message(format!(
                            "failed to persist subscription record: {error:#}"
                        ))
                    })?;

                Ok(SubscriptionResponse {
                    subscription_id: session.subscription_id,
                    customer_id,
                    status: session.status,
                    product_id: request.product_id,
                    payment_url: session.payment_url,
                })
            }
            Err(error) if self.mode.is_test() => {
                warn!(
                    ?error,
                    "payment processor call failed; returning mock subscription response (test mode)"
                );
                let mock_id = format!("mock_subscription_{}", Utc::now().timestamp());
                Ok(SubscriptionResponse {
                    payment_url: Some(format!("https://checkout.dodopayments.com/mock/{mock_id}")),
                    subscription_id: mock_id,
                    customer_id: request.customer.customer_id.clone().unwrap_or_default(),
                    status: "active".to_string(),
                    product_id: request.product_id,
                })
            }
            Err(error) => Err(AppError::Upstream(format!("{error:#}"))),
        }
    }

    pub async fn get_payment(&self, payment_id: &str) -> AppResult<Option<PaymentRecord>> {
        self.store.find_payment(payment_id).await.map_err(|error| {
            AppError::Message(format!("failed to look up payment record: {error:#}"))
        })
    }
}
