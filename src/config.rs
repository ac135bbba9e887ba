use once_cell::sync::Lazy;

/// Connection string for the MongoDB deployment backing the record store.
/// Defaults to a local instance.
pub static MONGO_URL: Lazy<String> = Lazy::new(|| {
    std::env::var("MONGO_URL").unwrap_or_else(|_| "mongodb://localhost:27017".to_string())
});

/// Database holding the `payments` and `subscriptions` collections.
pub static DB_NAME: Lazy<String> =
    Lazy::new(|| std::env::var("DB_NAME").unwrap_or_else(|_| "test_database".to_string()));

/// Bearer token for the Dodo Payments API. Must be set via the
/// `DODO_PAYMENTS_API_KEY` env variable.
pub static DODO_PAYMENTS_API_KEY: Lazy<String> = Lazy::new(|| {
    std::env::var("DODO_PAYMENTS_API_KEY").expect("DODO_PAYMENTS_API_KEY must be set")
});

/// Shared secret used to authenticate inbound webhook deliveries. Optional in
/// test mode; live mode refuses to start without it.
pub static DODO_PAYMENTS_WEBHOOK_SECRET: Lazy<Option<String>> =
    Lazy::new(|| read_optional_env("DODO_PAYMENTS_WEBHOOK_SECRET"));

/// Optional override for the Dodo Payments API base URL. When unset, the
/// base URL follows the configured mode.
pub static DODO_PAYMENTS_API_BASE: Lazy<Option<String>> =
    Lazy::new(|| read_optional_env("DODO_PAYMENTS_API_BASE"));

/// Address the HTTP server should bind to. Defaults to `0.0.0.0`.
pub static BIND_ADDRESS: Lazy<String> =
    Lazy::new(|| std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0".to_string()));

/// Port the HTTP server should listen on. Defaults to `3000`.
pub static BIND_PORT: Lazy<u16> = Lazy::new(|| {
    std::env::var("BIND_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3000)
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentsMode {
    Test,
    Live,
}

impl PaymentsMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentsMode::Test => "test",
            PaymentsMode::Live => "live",
        }
    }

    pub fn is_test(&self) -> bool {
        matches!(self, PaymentsMode::Test)
    }

    pub fn default_api_base(&self) -> &'static str {
        match self {
            PaymentsMode::Test => "https://test.dodopayments.com",
            PaymentsMode::Live => "https://live.dodopayments.com",
        }
    }
}

fn parse_payments_mode() -> PaymentsMode {
    match std::env::var("DODO_PAYMENTS_MODE") {
        Ok(raw) if raw.trim() == "test" => PaymentsMode::Test,
        Ok(_) => PaymentsMode::Live,
        Err(_) => PaymentsMode::Test,
    }
}

// key: payments-config -> mode-gate,mock-fallback
pub static DODO_PAYMENTS_MODE: Lazy<PaymentsMode> = Lazy::new(parse_payments_mode);

fn read_optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
