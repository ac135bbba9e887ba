use axum::{
    routing::{get, post},
    Router,
};
use axum_prometheus::PrometheusMetricLayer;

use crate::payments::{api, webhook};

async fn root() -> &'static str {
    "Payments API"
}

/// Full application router: banner, prometheus metrics, and the API routes.
/// The caller layers the `PaymentsService` extension on top. Installs the
/// global metrics recorder, so build it once per process.
pub fn app() -> Router {
    let (prometheus_layer, metrics_handle) = PrometheusMetricLayer::pair();
    Router::new()
        .route("/", get(root))
        .route(
            "/metrics",
            get(move || async move { metrics_handle.render() }),
        )
        .merge(api_routes())
        .layer(prometheus_layer)
}

pub fn api_routes() -> Router {
    Router::new()
        .route("/api/payments/checkout", post(api::create_checkout))
        .route("/api/payments/subscriptions", post(api::create_subscription))
        .route("/api/payments/payments/:payment_id", get(api::get_payment))
        .route("/api/payments/webhooks/dodo", post(webhook::dodo_webhook))
        .route("/api/health", get(api::health))
}
