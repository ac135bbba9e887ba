pub mod api;
pub mod dodo;
pub mod models;
pub mod service;
pub mod store;
pub mod webhook;

pub use dodo::{CheckoutSession, DodoClient, SubscriptionSession};
pub use models::{
    BillingAddress, CreatePaymentRequest, CreateSubscriptionRequest, PaymentCustomer,
    PaymentRecord, PaymentResponse, PaymentStatus, ProductItem, SubscriptionRecord,
    SubscriptionResponse, SubscriptionStatus, WebhookEvent,
};
pub use service::PaymentsService;
pub use store::{MongoRecordStore, RecordStore, UpdateOutcome};
pub use webhook::{apply_event, verify_signature, DispatchOutcome, EventKind};
