mod common;

use std::sync::Arc;

use chrono::Utc;
use common::{active_subscription, pending_payment, MemoryStore};
use payments_backend::payments::{
    apply_event, DispatchOutcome, PaymentStatus, RecordStore, SubscriptionStatus, WebhookEvent,
};
use serde_json::{json, Value};

fn event(kind: &str, data: Value) -> WebhookEvent {
    let Value::Object(data) = data else {
        panic!("event data must be an object");
    };
    WebhookEvent {
        business_id: "biz_1".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        kind: kind.to_string(),
        data,
    }
}

#[tokio::test]
async fn payment_succeeded_marks_the_record_success() {
    let store = Arc::new(MemoryStore::default());
    store.insert_payment(&pending_payment("p1")).await.unwrap();

    let data = json!({ "payment_id": "p1", "amount": 1000 });
    let outcome = apply_event(store.as_ref(), &event("payment.succeeded", data.clone()))
        .await
        .unwrap();

    assert_eq!(outcome, DispatchOutcome::Applied);
    let record = store.payment("p1").unwrap();
    assert_eq!(record.status, PaymentStatus::Success);
    assert_eq!(record.metadata, Some(json!({ "webhook_data": data })));
}

#[tokio::test]
async fn payment_failed_captures_the_error() {
    let store = Arc::new(MemoryStore::default());
    store.insert_payment(&pending_payment("p1")).await.unwrap();

    let data = json!({ "payment_id": "p1", "error": "card_declined" });
    let outcome = apply_event(store.as_ref(), &event("payment.failed", data.clone()))
        .await
        .unwrap();

    assert_eq!(outcome, DispatchOutcome::Applied);
    let record = store.payment("p1").unwrap();
    assert_eq!(record.status, PaymentStatus::Failed);
    assert_eq!(
        record.metadata,
        Some(json!({ "webhook_data": data, "error": "card_declined" }))
    );
}

#[tokio::test]
async fn untracked_payment_is_a_no_op() {
    let store = Arc::new(MemoryStore::default());

    let outcome = apply_event(
        store.as_ref(),
        &event("payment.succeeded", json!({ "payment_id": "p404" })),
    )
    .await
    .unwrap();

    assert_eq!(outcome, DispatchOutcome::RecordMissing);
    assert_eq!(store.payment_count(), 0);
}

#[tokio::test]
async fn missing_business_id_skips_the_store() {
    let store = Arc::new(MemoryStore::default());
    store.insert_payment(&pending_payment("p1")).await.unwrap();

    let outcome = apply_event(
        store.as_ref(),
        &event("payment.succeeded", json!({ "unrelated": true })),
    )
    .await
    .unwrap();

    assert_eq!(outcome, DispatchOutcome::IdMissing);
    assert_eq!(store.payment("p1").unwrap().status, PaymentStatus::Pending);
}

#[tokio::test]
async fn unknown_event_type_never_mutates() {
    let store = Arc::new(MemoryStore::default());
    store.insert_payment(&pending_payment("p1")).await.unwrap();

    let outcome = apply_event(
        store.as_ref(),
        &event("payment.refunded", json!({ "payment_id": "p1" })),
    )
    .await
    .unwrap();

    assert_eq!(
        outcome,
        DispatchOutcome::Ignored("payment.refunded".to_string())
    );
    assert_eq!(store.payment("p1").unwrap().status, PaymentStatus::Pending);
}

#[tokio::test]
async fn subscription_events_follow_the_dispatch_table() {
    let store = Arc::new(MemoryStore::default());
    store
        .insert_subscription(&active_subscription("sub_1"))
        .await
        .unwrap();

    let cases = [
        ("subscription.on_hold", SubscriptionStatus::OnHold),
        ("subscription.failed", SubscriptionStatus::Failed),
        ("subscription.active", SubscriptionStatus::Active),
        ("subscription.renewed", SubscriptionStatus::Active),
    ];
    for (kind, expected) in cases {
        let outcome = apply_event(
            store.as_ref(),
            &event(kind, json!({ "subscription_id": "sub_1" })),
        )
        .await
        .unwrap();
        assert_eq!(outcome, DispatchOutcome::Applied, "event {kind}");
        assert_eq!(store.subscription("sub_1").unwrap().status, expected, "event {kind}");
    }
}

#[tokio::test]
async fn renewal_captures_the_new_period_end() {
    let store = Arc::new(MemoryStore::default());
    store
        .insert_subscription(&active_subscription("sub_1"))
        .await
        .unwrap();

    let data = json!({ "subscription_id": "sub_1", "current_period_end": "2024-02-01T00:00:00Z" });
    apply_event(store.as_ref(), &event("subscription.renewed", data.clone()))
        .await
        .unwrap();

    let record = store.subscription("sub_1").unwrap();
    assert_eq!(
        record.metadata,
        Some(json!({
            "webhook_data": data,
            "current_period_end": "2024-02-01T00:00:00Z",
        }))
    );
}

#[tokio::test]
async fn plan_change_records_both_plans() {
    let store = Arc::new(MemoryStore::default());
    store
        .insert_subscription(&active_subscription("sub_1"))
        .await
        .unwrap();

    let data = json!({
        "subscription_id": "sub_1",
        "previous_plan": "basic",
        "new_plan": "pro",
        "current_period_end": "2024-03-01T00:00:00Z",
    });
    let outcome = apply_event(
        store.as_ref(),
        &event("subscription.plan_changed", data.clone()),
    )
    .await
    .unwrap();

    assert_eq!(outcome, DispatchOutcome::Applied);
    let record = store.subscription("sub_1").unwrap();
    assert_eq!(record.status, SubscriptionStatus::Active);
    assert_eq!(
        record.metadata,
        Some(json!({
            "webhook_data": data,
            "previous_plan": "basic",
            "new_plan": "pro",
            "current_period_end": "2024-03-01T00:00:00Z",
        }))
    );
}

#[tokio::test]
async fn reapplying_the_same_event_is_idempotent() {
    let store = Arc::new(MemoryStore::default());
    store
        .insert_subscription(&active_subscription("sub_1"))
        .await
        .unwrap();

    let data = json!({ "subscription_id": "sub_1", "current_period_end": "2024-02-01T00:00:00Z" });
    let first = apply_event(store.as_ref(), &event("subscription.active", data.clone()))
        .await
        .unwrap();
    let after_first = store.subscription("sub_1").unwrap();

    let second = apply_event(store.as_ref(), &event("subscription.active", data))
        .await
        .unwrap();
    let after_second = store.subscription("sub_1").unwrap();

    assert_eq!(first, DispatchOutcome::Applied);
    assert_eq!(second, DispatchOutcome::Applied);
    assert_eq!(after_first.status, after_second.status);
    assert_eq!(after_first.metadata, after_second.metadata);
}
