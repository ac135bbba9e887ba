use axum::{
    extract::{Extension, Path},
    Json,
};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};

use super::models::{
    CreatePaymentRequest, CreateSubscriptionRequest, PaymentRecord, PaymentResponse,
    SubscriptionResponse,
};
use super::service::PaymentsService;

// key: payments-api -> http-handlers

pub async fn create_checkout(
    Extension(service): Extension<PaymentsService>,
    Json(payload): Json<CreatePaymentRequest>,
) -> AppResult<Json<PaymentResponse>> {
    let response = service.create_payment(payload, None).await?;
    Ok(Json(response))
}

pub async fn create_subscription(
    Extension(service): Extension<PaymentsService>,
    Json(payload): Json<CreateSubscriptionRequest>,
) -> AppResult<Json<SubscriptionResponse>> {
    let response = service.create_subscription(payload, None).await?;
    Ok(Json(response))
}

pub async fn get_payment(
    Extension(service): Extension<PaymentsService>,
    Path(payment_id): Path<String>,
) -> AppResult<Json<PaymentRecord>> {
    let record = service.get_payment(&payment_id).await?;
    record.map(Json).ok_or(AppError::NotFound)
}

/// Reports processor credential state, the configured mode, and record-store
/// connectivity.
pub async fn health(Extension(service): Extension<PaymentsService>) -> Json<Value> {
    let connected = service.store().ping().await.is_ok();
    Json(json!({
        "status": "healthy",
        "dodo_payments": {
            "api_key_configured": service.api_key_configured(),
            "webhook_secret_configured": service.webhook_secret().is_some(),
            "mode": service.mode().as_str(),
        },
        "database": {
            "connected": connected,
            "name": service.store().name(),
        },
    }))
}
