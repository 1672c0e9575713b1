//! Integration tests for subscription HTTP endpoints.
//!
//! These tests drive the full router with `tower::ServiceExt::oneshot`:
//! 1. Status and access endpoints create and report the trial
//! 2. Checkout sessions are opened for the calling subscriber
//! 3. Activation requires a verified checkout session, redeemable once
//! 4. Stripe webhooks activate plans only with a valid signature, once per session

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

use research_pilot::adapters::clock::ManualClock;
use research_pilot::adapters::http::subscription::{
    STRIPE_SIGNATURE_HEADER, SUBSCRIBER_ID_HEADER,
};
use research_pilot::adapters::http::{app_router, SubscriptionAppState};
use research_pilot::adapters::storage::{InMemoryPaymentLedger, InMemorySubscriptionStore};
use research_pilot::adapters::stripe::MockPaymentVerifier;
use research_pilot::application::{LifecyclePolicy, SubscriptionLifecycle};
use research_pilot::domain::foundation::Timestamp;
use research_pilot::domain::subscription::{
    CheckoutVerification, PaidPlan, StripeWebhookVerifier,
};
use research_pilot::ports::PaymentVerifier;

// =============================================================================
// Test Infrastructure
// =============================================================================

const WEBHOOK_SECRET: &str = "whsec_integration";

struct TestApp {
    router: Router,
    clock: ManualClock,
    payments: MockPaymentVerifier,
}

fn start() -> Timestamp {
    Timestamp::from_unix_secs(1_705_276_800).unwrap()
}

fn webhook_verifier() -> StripeWebhookVerifier {
    StripeWebhookVerifier::new(SecretString::new(WEBHOOK_SECRET.to_string()))
}

fn test_app(policy: LifecyclePolicy) -> TestApp {
    let clock = ManualClock::new(start());
    let payments = MockPaymentVerifier::new();
    let lifecycle = Arc::new(SubscriptionLifecycle::new(
        Arc::new(InMemorySubscriptionStore::new()),
        Arc::new(clock.clone()),
        policy,
    ));

    let state = SubscriptionAppState {
        lifecycle,
        payment_ledger: Arc::new(InMemoryPaymentLedger::new()),
        payment_verifier: Some(Arc::new(payments.clone()) as Arc<dyn PaymentVerifier>),
        webhook_verifier: Some(Arc::new(webhook_verifier())),
        require_payment_verification: true,
        verbose_errors: false,
    };

    TestApp {
        router: app_router(state),
        clock,
        payments,
    }
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    };
    (status, body)
}

fn get(path: &str, subscriber: &str) -> Request<Body> {
    Request::get(path)
        .header(SUBSCRIBER_ID_HEADER, subscriber)
        .body(Body::empty())
        .unwrap()
}

fn post_json(path: &str, subscriber: &str, body: Value) -> Request<Body> {
    Request::post(path)
        .header(SUBSCRIBER_ID_HEADER, subscriber)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn webhook(payload: &[u8], signature: &str) -> Request<Body> {
    Request::post("/api/webhooks/stripe")
        .header(STRIPE_SIGNATURE_HEADER, signature)
        .body(Body::from(payload.to_vec()))
        .unwrap()
}

// =============================================================================
// Status and access
// =============================================================================

#[tokio::test]
async fn first_status_call_starts_the_trial() {
    let app = test_app(LifecyclePolicy::default());

    let (status, body) = send(&app, get("/api/subscription", "alice")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plan"], "free_trial");
    assert_eq!(body["days_remaining"], 30);
    assert_eq!(body["is_active"], true);
    assert_eq!(body["has_access"], true);
    assert!(body["expiry_date"].is_string());
}

#[tokio::test]
async fn access_follows_the_clock() {
    let app = test_app(LifecyclePolicy::default());
    send(&app, get("/api/subscription", "alice")).await;

    app.clock.advance_days(25);
    let (_, body) = send(&app, get("/api/subscription", "alice")).await;
    assert_eq!(body["days_remaining"], 5);
    assert_eq!(body["notice"]["type"], "reminder");

    app.clock.advance_days(6);
    let (status, body) = send(&app, get("/api/subscription/access", "alice")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"has_access": false}));
}

#[tokio::test]
async fn missing_subscriber_header_is_unauthorized() {
    let app = test_app(LifecyclePolicy::default());
    let request = Request::get("/api/subscription/access")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn plans_are_listed_without_a_subscriber() {
    let app = test_app(LifecyclePolicy::default());
    let request = Request::get("/api/subscription/plans")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trial"]["plan"], "free_trial");
    assert_eq!(body["plans"].as_array().unwrap().len(), 3);
}

// =============================================================================
// Activation
// =============================================================================

#[tokio::test]
async fn verified_checkout_activates_lifetime() {
    let app = test_app(LifecyclePolicy::default());
    app.payments.add_paid_session("cs_live_1", "alice", PaidPlan::Lifetime);

    let (status, body) = send(
        &app,
        post_json(
            "/api/subscription/activate",
            "alice",
            json!({"plan": "lifetime", "checkout_session_id": "cs_live_1"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plan"], "lifetime");
    assert!(body["expiry_date"].is_null());
    assert!(body["days_remaining"].is_null());

    app.clock.advance_days(3_650);
    let (_, body) = send(&app, get("/api/subscription/access", "alice")).await;
    assert_eq!(body["has_access"], true);
}

fn activate(subscriber: &str, plan: &str, session_id: &str) -> Request<Body> {
    post_json(
        "/api/subscription/activate",
        subscriber,
        json!({"plan": plan, "checkout_session_id": session_id}),
    )
}

#[tokio::test]
async fn checkout_then_payment_then_activation() {
    let app = test_app(LifecyclePolicy::default());

    let (status, body) = send(
        &app,
        post_json(
            "/api/subscription/checkout",
            "alice",
            json!({
                "plan": "yearly",
                "success_url": "https://app.test/paid",
                "cancel_url": "https://app.test/plans"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let session_id = body["session_id"].as_str().unwrap().to_string();
    assert!(body["url"].as_str().unwrap().contains(&session_id));

    let (status, body) = send(&app, activate("alice", "yearly", &session_id)).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["code"], "PAYMENT_NOT_VERIFIED");

    assert!(app.payments.mark_paid(&session_id));
    let (status, body) = send(&app, activate("alice", "yearly", &session_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plan"], "yearly");
    assert_eq!(body["days_remaining"], 365);
}

#[tokio::test]
async fn checkout_for_the_trial_is_a_bad_request() {
    let app = test_app(LifecyclePolicy::default());

    let (status, body) = send(
        &app,
        post_json(
            "/api/subscription/checkout",
            "alice",
            json!({
                "plan": "free_trial",
                "success_url": "https://app.test/paid",
                "cancel_url": "https://app.test/plans"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_PLAN");
    assert!(app.payments.created().is_empty());
}

#[tokio::test]
async fn paid_session_cannot_activate_a_second_subscriber() {
    let app = test_app(LifecyclePolicy::default());
    app.payments
        .add_paid_session("cs_shared", "alice", PaidPlan::Lifetime);

    let (status, _) = send(&app, activate("alice", "lifetime", "cs_shared")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, activate("mallory", "lifetime", "cs_shared")).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["code"], "PAYMENT_NOT_VERIFIED");

    let (_, body) = send(&app, get("/api/subscription", "mallory")).await;
    assert_eq!(body["plan"], "free_trial");
}

#[tokio::test]
async fn session_without_subscriber_metadata_cannot_activate() {
    let app = test_app(LifecyclePolicy::default());
    app.payments.add_session(CheckoutVerification {
        session_id: "cs_anon".to_string(),
        payment_status: "paid".to_string(),
        plan: Some("lifetime".to_string()),
        subscriber_id: None,
        amount_total: Some(99_900),
        currency: Some("cny".to_string()),
    });

    for subscriber in ["alice", "bob"] {
        let (status, _) = send(&app, activate(subscriber, "lifetime", "cs_anon")).await;
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    }
}

#[tokio::test]
async fn replayed_session_after_29_days_does_not_renew() {
    let app = test_app(LifecyclePolicy::default());
    app.payments
        .add_paid_session("cs_month", "alice", PaidPlan::Monthly);
    send(&app, activate("alice", "monthly", "cs_month")).await;

    app.clock.advance_days(29);
    let (status, body) = send(&app, activate("alice", "monthly", "cs_month")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["days_remaining"], 1);
    assert_eq!(body["start_date"], start().to_string());
}

#[tokio::test]
async fn activation_without_session_requires_payment() {
    let app = test_app(LifecyclePolicy::default());

    let (status, body) = send(
        &app,
        post_json("/api/subscription/activate", "alice", json!({"plan": "monthly"})),
    )
    .await;

    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["code"], "PAYMENT_NOT_VERIFIED");
}

#[tokio::test]
async fn unknown_plan_is_a_bad_request() {
    let app = test_app(LifecyclePolicy::default());

    let (status, body) = send(
        &app,
        post_json("/api/subscription/activate", "alice", json!({"plan": "weekly"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_PLAN");
}

// =============================================================================
// Reset
// =============================================================================

#[tokio::test]
async fn reset_is_forbidden_by_default() {
    let app = test_app(LifecyclePolicy::default());

    let (status, body) = send(
        &app,
        post_json("/api/subscription/reset", "alice", json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "TRIAL_RESET_DISABLED");
}

#[tokio::test]
async fn demo_reset_restarts_the_trial() {
    let app = test_app(LifecyclePolicy {
        allow_trial_reset: true,
        ..Default::default()
    });
    app.payments.add_paid_session("cs_1", "alice", PaidPlan::Yearly);
    send(
        &app,
        post_json(
            "/api/subscription/activate",
            "alice",
            json!({"plan": "yearly", "checkout_session_id": "cs_1"}),
        ),
    )
    .await;

    let (status, body) = send(
        &app,
        post_json("/api/subscription/reset", "alice", json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plan"], "free_trial");
    assert_eq!(body["days_remaining"], 30);
}

// =============================================================================
// Webhooks
// =============================================================================

fn checkout_completed(subscriber: &str, plan: &str) -> Vec<u8> {
    json!({
        "id": "evt_checkout",
        "type": "checkout.session.completed",
        "created": start().as_unix_secs(),
        "data": {"object": {
            "id": "cs_hook",
            "payment_status": "paid",
            "metadata": {"plan": plan, "subscriber_id": subscriber}
        }}
    })
    .to_string()
    .into_bytes()
}

#[tokio::test]
async fn signed_checkout_webhook_activates_plan() {
    let app = test_app(LifecyclePolicy::default());
    let payload = checkout_completed("bob", "monthly");
    let signature = webhook_verifier()
        .sign(start().as_unix_secs(), &payload)
        .unwrap();

    let (status, body) = send(&app, webhook(&payload, &signature)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "activated");

    let (_, body) = send(&app, get("/api/subscription", "bob")).await;
    assert_eq!(body["plan"], "monthly");
    assert_eq!(body["days_remaining"], 30);
}

#[tokio::test]
async fn duplicate_webhook_delivery_is_acknowledged_once() {
    let app = test_app(LifecyclePolicy::default());
    let payload = checkout_completed("bob", "monthly");
    let signature = webhook_verifier()
        .sign(start().as_unix_secs(), &payload)
        .unwrap();
    send(&app, webhook(&payload, &signature)).await;

    app.clock.advance_days(29);
    let signature = webhook_verifier()
        .sign(start().plus_days(29).as_unix_secs(), &payload)
        .unwrap();
    let (status, body) = send(&app, webhook(&payload, &signature)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "ignored");

    let (_, body) = send(&app, get("/api/subscription", "bob")).await;
    assert_eq!(body["days_remaining"], 1);
}

#[tokio::test]
async fn webhook_after_api_activation_changes_nothing() {
    let app = test_app(LifecyclePolicy::default());
    app.payments.add_paid_session("cs_hook", "bob", PaidPlan::Monthly);
    send(&app, activate("bob", "monthly", "cs_hook")).await;

    let payload = checkout_completed("bob", "monthly");
    let signature = webhook_verifier()
        .sign(start().as_unix_secs(), &payload)
        .unwrap();
    let (status, body) = send(&app, webhook(&payload, &signature)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "ignored");
}

#[tokio::test]
async fn forged_webhook_is_rejected() {
    let app = test_app(LifecyclePolicy::default());
    let payload = checkout_completed("bob", "lifetime");
    let forged = StripeWebhookVerifier::new(SecretString::new("whsec_other".to_string()))
        .sign(start().as_unix_secs(), &payload)
        .unwrap();

    let (status, body) = send(&app, webhook(&payload, &forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_WEBHOOK_SIGNATURE");

    let (_, body) = send(&app, get("/api/subscription", "bob")).await;
    assert_eq!(body["plan"], "free_trial");
}

#[tokio::test]
async fn stale_webhook_is_rejected() {
    let app = test_app(LifecyclePolicy::default());
    let payload = checkout_completed("bob", "yearly");
    let signature = webhook_verifier()
        .sign(start().as_unix_secs(), &payload)
        .unwrap();

    app.clock.advance_secs(3_600);
    let (status, _) = send(&app, webhook(&payload, &signature)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
