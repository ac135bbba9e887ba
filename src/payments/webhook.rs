use axum::{body::Bytes, extract::Extension, http::HeaderMap, Json};
use hmac::{Hmac, Mac};
use serde_json::{json, Map, Value};
use sha2::Sha256;
use tracing::{error, info, warn};

use crate::error::{AppError, AppResult};

use super::models::{PaymentStatus, SubscriptionStatus, WebhookEvent};
use super::service::PaymentsService;
use super::store::{RecordStore, UpdateOutcome};

/// Checks that `signature` is the hex HMAC-SHA256 digest of
/// `"{webhook_id}.{timestamp}.{body}"` keyed by `secret`.
///
/// Total over its inputs: a malformed UTF-8 body or an undecodable signature
/// yields `false` instead of an error. The digest comparison is constant
/// time.
pub fn verify_signature(
    body: &[u8],
    signature: &str,
    webhook_id: &str,
    timestamp: &str,
    secret: &str,
) -> bool {
    let Ok(body) = std::str::from_utf8(body) else {
        return false;
    };
    let Ok(provided) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(format!("{webhook_id}.{timestamp}.{body}").as_bytes());
    mac.verify_slice(&provided).is_ok()
}

/// Known webhook event types plus a catch-all for anything unrecognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    PaymentSucceeded,
    PaymentFailed,
    SubscriptionActive,
    SubscriptionOnHold,
    SubscriptionFailed,
    SubscriptionRenewed,
    SubscriptionPlanChanged,
    Unknown(String),
}

impl EventKind {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "payment.succeeded" => EventKind::PaymentSucceeded,
            "payment.failed" => EventKind::PaymentFailed,
            "subscription.active" => EventKind::SubscriptionActive,
            "subscription.on_hold" => EventKind::SubscriptionOnHold,
            "subscription.failed" => EventKind::SubscriptionFailed,
            "subscription.renewed" => EventKind::SubscriptionRenewed,
            "subscription.plan_changed" => EventKind::SubscriptionPlanChanged,
            other => EventKind::Unknown(other.to_string()),
        }
    }
}

/// What a single delivery did to the record store. Every outcome maps to an
/// HTTP 200 so the processor does not retry-storm on events this system
/// cannot act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A matching record was found and the status transition applied.
    Applied,
    /// The event referenced a business id this system does not track.
    RecordMissing,
    /// The payload carried no business id; nothing was dispatched.
    IdMissing,
    /// Recognized envelope with an unhandled event type.
    Ignored(String),
}

// key: webhook-dispatch -> event-table,metadata-capture

/// One delivery produces at most one record mutation. Metadata is captured
/// per event type and replaces the record's metadata wholesale.
pub async fn apply_event(
    store: &dyn RecordStore,
    event: &WebhookEvent,
) -> anyhow::Result<DispatchOutcome> {
    let data = &event.data;
    match EventKind::parse(&event.kind) {
        EventKind::PaymentSucceeded => {
            let metadata = json!({ "webhook_data": data });
            update_payment(store, data, PaymentStatus::Success, metadata).await
        }
        EventKind::PaymentFailed => {
            let metadata = json!({ "webhook_data": data, "error": data.get("error") });
            update_payment(store, data, PaymentStatus::Failed, metadata).await
        }
        EventKind::SubscriptionActive => {
            let metadata = json!({
                "webhook_data": data,
                "current_period_end": data.get("current_period_end"),
            });
            update_subscription(store, data, SubscriptionStatus::Active, metadata).await
        }
        EventKind::SubscriptionOnHold => {
            let metadata = json!({ "webhook_data": data });
            update_subscription(store, data, SubscriptionStatus::OnHold, metadata).await
        }
        EventKind::SubscriptionFailed => {
            let metadata = json!({ "webhook_data": data });
            update_subscription(store, data, SubscriptionStatus::Failed, metadata).await
        }
        EventKind::SubscriptionRenewed => {
            let metadata = json!({
                "webhook_data": data,
                "current_period_end": data.get("current_period_end"),
            });
            update_subscription(store, data, SubscriptionStatus::Active, metadata).await
        }
        EventKind::SubscriptionPlanChanged => {
            let metadata = json!({
                "webhook_data": data,
                "previous_plan": data.get("previous_plan"),
                "new_plan": data.get("new_plan"),
                "current_period_end": data.get("current_period_end"),
            });
            update_subscription(store, data, SubscriptionStatus::Active, metadata).await
        }
        EventKind::Unknown(kind) => Ok(DispatchOutcome::Ignored(kind)),
    }
}

async fn update_payment(
    store: &dyn RecordStore,
    data: &Map<String, Value>,
    status: PaymentStatus,
    metadata: Value,
) -> anyhow::Result<DispatchOutcome> {
    let Some(payment_id) = data.get("payment_id").and_then(Value::as_str) else {
        return Ok(DispatchOutcome::IdMissing);
    };
    match store
        .update_payment_status(payment_id, status, Some(metadata))
        .await?
    {
        UpdateOutcome::Applied => {
            info!(payment_id, ?status, "payment status updated from webhook");
            Ok(DispatchOutcome::Applied)
        }
        UpdateOutcome::NotFound => Ok(DispatchOutcome::RecordMissing),
    }
}

async fn update_subscription(
    store: &dyn RecordStore,
    data: &Map<String, Value>,
    status: SubscriptionStatus,
    metadata: Value,
) -> anyhow::Result<DispatchOutcome> {
    let Some(subscription_id) = data.get("subscription_id").and_then(Value::as_str) else {
        return Ok(DispatchOutcome::IdMissing);
    };
    match store
        .update_subscription_status(subscription_id, status, Some(metadata))
        .await?
    {
        UpdateOutcome::Applied => {
            info!(
                subscription_id,
                ?status,
                "subscription status updated from webhook"
            );
            Ok(DispatchOutcome::Applied)
        }
        UpdateOutcome::NotFound => Ok(DispatchOutcome::RecordMissing),
    }
}

// key: webhooks-dodo -> signature-gate,dispatch
pub async fn dodo_webhook(
    Extension(service): Extension<PaymentsService>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let signature = header_value(&headers, "webhook-signature")?;
    let webhook_id = header_value(&headers, "webhook-id")?;
    let timestamp = header_value(&headers, "webhook-timestamp")?;

    let Some(secret) = service.webhook_secret() else {
        error!("webhook delivery received but no webhook secret is configured");
        return Err(AppError::Unauthorized);
    };
    if !verify_signature(&body, signature, webhook_id, timestamp, secret) {
        warn!(webhook_id, "webhook signature verification failed");
        return Err(AppError::Unauthorized);
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|error| AppError::BadRequest(format!("malformed webhook event: {error}")))?;

    let outcome = apply_event(service.store(), &event)
        .await
        .map_err(|error| AppError::Message(format!("failed to process webhook event: {error:#}")))?;
    match outcome {
        DispatchOutcome::Applied => {
            info!(event_type = %event.kind, "webhook event applied");
        }
        DispatchOutcome::RecordMissing => {
            info!(event_type = %event.kind, "webhook event referenced an untracked record");
        }
        DispatchOutcome::IdMissing => {
            info!(event_type = %event.kind, "webhook event carried no business id");
        }
        DispatchOutcome::Ignored(kind) => {
            warn!(event_type = %kind, "unhandled webhook event type");
        }
    }

    Ok(Json(json!({ "status": "success" })))
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AppError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::BadRequest(format!("missing {name} header")))
}
