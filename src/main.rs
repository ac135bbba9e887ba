use std::net::SocketAddr;
use std::sync::Arc;

use axum::Extension;
use tracing_subscriber::{fmt, EnvFilter};

use payments_backend::config;
use payments_backend::db;
use payments_backend::payments::{DodoClient, MongoRecordStore, PaymentsService};
use payments_backend::routes;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    dotenvy::dotenv().ok();
    // Fail fast if the processor API key is missing
    let api_key = config::DODO_PAYMENTS_API_KEY.as_str();
    let mode = *config::DODO_PAYMENTS_MODE;
    let webhook_secret = config::DODO_PAYMENTS_WEBHOOK_SECRET.clone();
    if !mode.is_test() && webhook_secret.is_none() {
        return Err("DODO_PAYMENTS_WEBHOOK_SECRET must be set when DODO_PAYMENTS_MODE is not 'test'".into());
    }
    if mode.is_test() {
        tracing::warn!("running in test mode; upstream failures return mock responses");
    }

    let database = db::connect(config::MONGO_URL.as_str(), config::DB_NAME.as_str()).await?;
    if let Err(error) = db::ensure_indexes(&database).await {
        tracing::warn!(?error, "Failed to provision record store indexes; continuing");
    }

    let base_url = config::DODO_PAYMENTS_API_BASE
        .clone()
        .unwrap_or_else(|| mode.default_api_base().to_string());
    let gateway = DodoClient::new(base_url, api_key)?;
    let store = Arc::new(MongoRecordStore::new(database));
    let service = PaymentsService::new(store, gateway, mode, webhook_secret);

    let app = routes::app().layer(Extension(service));

    let addr: SocketAddr = format!("{}:{}", config::BIND_ADDRESS.as_str(), *config::BIND_PORT)
        .parse()
        .map_err(|error| Box::new(error) as Box<dyn std::error::Error>)?;
    tracing::info!(%addr, "Listening for incoming connections");
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
