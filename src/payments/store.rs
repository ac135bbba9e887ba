use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::{doc, to_bson};
use mongodb::{Collection, Database};
use serde_json::Value;

use super::models::{PaymentRecord, PaymentStatus, SubscriptionRecord, SubscriptionStatus};

/// Result of a status-transition attempt, keyed by business id.
///
/// Existence is decided by an explicit lookup, never inferred from the
/// write's modified count: a record that already carries the target values
/// still reports `Applied`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    NotFound,
}

// key: record-store -> persistence-seam,status-transitions
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert_payment(&self, record: &PaymentRecord) -> Result<()>;
    async fn insert_subscription(&self, record: &SubscriptionRecord) -> Result<()>;
    async fn find_payment(&self, payment_id: &str) -> Result<Option<PaymentRecord>>;
    async fn update_payment_status(
        &self,
        payment_id: &str,
        status: PaymentStatus,
        metadata: Option<Value>,
    ) -> Result<UpdateOutcome>;
    async fn update_subscription_status(
        &self,
        subscription_id: &str,
        status: SubscriptionStatus,
        metadata: Option<Value>,
    ) -> Result<UpdateOutcome>;
    async fn ping(&self) -> Result<()>;
    fn name(&self) -> &str;
}

pub struct MongoRecordStore {
    db: Database,
}

impl MongoRecordStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn payments(&self) -> Collection<PaymentRecord> {
        self.db.collection("payments")
    }

    fn subscriptions(&self) -> Collection<SubscriptionRecord> {
        self.db.collection("subscriptions")
    }
}

#[async_trait]
impl RecordStore for MongoRecordStore {
    async fn insert_payment(&self, record: &PaymentRecord) -> Result<()> {
        self.payments()
            .insert_one(record)
            .await
            .context("failed to insert payment record")?;
        Ok(())
    }

    async fn insert_subscription(&self, record: &SubscriptionRecord) -> Result<()> {
        self.subscriptions()
            .insert_one(record)
            .await
            .context("failed to insert subscription record")?;
        Ok(())
    }

    async fn find_payment(&self, payment_id: &str) -> Result<Option<PaymentRecord>> {
        self.payments()
            .find_one(doc! { "payment_id": payment_id })
            .await
            .context("failed to look up payment record")
    }

    async fn update_payment_status(
        &self,
        payment_id: &str,
        status: PaymentStatus,
        metadata: Option<Value>,
    ) -> Result<UpdateOutcome> {
        let coll = self.payments();
        let filter = doc! { "payment_id": payment_id };
        if coll
            .find_one(filter.clone())
            .await
            .context("failed to look up payment record")?
            .is_none()
        {
            return Ok(UpdateOutcome::NotFound);
        }

        let mut set = doc! {
            "status": to_bson(&status).context("failed to encode status")?,
            "updated_at": to_bson(&Utc::now()).context("failed to encode timestamp")?,
        };
        if let Some(metadata) = metadata {
            set.insert(
                "metadata",
                to_bson(&metadata).context("failed to encode metadata")?,
            );
        }
        coll.update_one(filter, doc! { "$set": set })
            .await
            .context("failed to update payment record")?;
        Ok(UpdateOutcome::Applied)
    }

    async fn update_subscription_status(
        &self,
        subscription_id: &str,
        status: SubscriptionStatus,
        metadata: Option<Value>,
    ) -> Result<UpdateOutcome> {
        let coll = self.subscriptions();
        let filter = doc! { "subscription_id": subscription_id };
        if coll
            .find_one(filter.clone())
            .await
            .context("failed to look up subscription record")?
            .is_none()
        {
            return Ok(UpdateOutcome::NotFound);
        }

        let mut set = doc! {
            "status": to_bson(&status).context("failed to encode status")?,
            "updated_at": to_bson(&Utc::now()).context("failed to encode timestamp")?,
        };
        if let Some(metadata) = metadata {
            set.insert(
                "metadata",
                to_bson(&metadata).context("failed to encode metadata")?,
            );
        }
        coll.update_one(filter, doc! { "$set": set })
            .await
            .context("failed to update subscription record")?;
        Ok(UpdateOutcome::Applied)
    }

    async fn ping(&self) -> Result<()> {
        self.db
            .run_command(doc! { "ping": 1 })
            .await
            .context("record store ping failed")?;
        Ok(())
    }

    fn name(&self) -> &str {
        self.db.name()
    }
}
