#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{Extension, Router};
use chrono::Utc;
use hmac::{Hmac, Mac};
use payments_backend::payments::{
    DodoClient, PaymentRecord, PaymentStatus, PaymentsService, RecordStore, SubscriptionRecord,
    SubscriptionStatus, UpdateOutcome,
};
use payments_backend::routes::api_routes;
use payments_backend::PaymentsMode;
use serde_json::Value;
use sha2::Sha256;

/// In-memory `RecordStore` standing in for MongoDB in router tests.
#[derive(Default)]
pub struct MemoryStore {
    payments: Mutex<HashMap<String, PaymentRecord>>,
    subscriptions: Mutex<HashMap<String, SubscriptionRecord>>,
}

impl MemoryStore {
    pub fn payment(&self, payment_id: &str) -> Option<PaymentRecord> {
        self.payments.lock().unwrap().get(payment_id).cloned()
    }

    pub fn subscription(&self, subscription_id: &str) -> Option<SubscriptionRecord> {
        self.subscriptions
            .lock()
            .unwrap()
            .get(subscription_id)
            .cloned()
    }

    pub fn payment_count(&self) -> usize {
        self.payments.lock().unwrap().len()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().unwrap().len()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_payment(&self, record: &PaymentRecord) -> anyhow::Result<()> {
        self.payments
            .lock()
            .unwrap()
            .insert(record.payment_id.clone(), record.clone());
        Ok(())
    }

    async fn insert_subscription(&self, record: &SubscriptionRecord) -> anyhow::Result<()> {
        self.subscriptions
            .lock()
            .unwrap()
            .insert(record.subscription_id.clone(), record.clone());
        Ok(())
    }

    async fn find_payment(&self, payment_id: &str) -> anyhow::Result<Option<PaymentRecord>> {
        Ok(self.payment(payment_id))
    }

    async fn update_payment_status(
        &self,
        payment_id: &str,
        status: PaymentStatus,
        metadata: Option<Value>,
    ) -> anyhow::Result<UpdateOutcome> {
        let mut payments = self.payments.lock().unwrap();
        match payments.get_mut(payment_id) {
            Some(record) => {
                record.status = status;
                record.updated_at = Utc::now();
                if let Some(metadata) = metadata {
                    record.metadata = Some(metadata);
                }
                Ok(UpdateOutcome::Applied)
            }
            None => Ok(UpdateOutcome::NotFound),
        }
    }

    async fn update_subscription_status(
        &self,
        subscription_id: &str,
        status: SubscriptionStatus,
        metadata: Option<Value>,
    ) -> anyhow::Result<UpdateOutcome> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        match subscriptions.get_mut(subscription_id) {
            Some(record) => {
                record.status = status;
                record.updated_at = Utc::now();
                if let Some(metadata) = metadata {
                    record.metadata = Some(metadata);
                }
                Ok(UpdateOutcome::Applied)
            }
            None => Ok(UpdateOutcome::NotFound),
        }
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

pub fn pending_payment(payment_id: &str) -> PaymentRecord {
    let now = Utc::now();
    PaymentRecord {
        id: payment_id.to_string(),
        payment_id: payment_id.to_string(),
        user_id: None,
        customer_id: Some("cus_1".to_string()),
        amount: 1000,
        currency: "USD".to_string(),
        status: PaymentStatus::Pending,
        product_id: Some("prod_1".to_string()),
        metadata: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn active_subscription(subscription_id: &str) -> SubscriptionRecord {
    let now = Utc::now();
    SubscriptionRecord {
        id: subscription_id.to_string(),
        subscription_id: subscription_id.to_string(),
        user_id: None,
        customer_id: "cus_1".to_string(),
        product_id: "prod_1".to_string(),
        status: SubscriptionStatus::Active,
        current_period_start: None,
        current_period_end: None,
        cancel_at_period_end: false,
        metadata: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn service(
    store: Arc<MemoryStore>,
    base_url: &str,
    mode: PaymentsMode,
    webhook_secret: Option<&str>,
) -> PaymentsService {
    let gateway = DodoClient::new(base_url, "key_test").unwrap();
    PaymentsService::new(store, gateway, mode, webhook_secret.map(str::to_string))
}

pub fn app(service: PaymentsService) -> Router {
    Router::new().merge(api_routes()).layer(Extension(service))
}

pub fn sign(webhook_id: &str, timestamp: &str, body: &str, secret: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{webhook_id}.{timestamp}.{body}").as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
