//! End-to-end webhook behavior through the full router.
//!
//! Drives the service with in-process requests and fake booking
//! collaborators, covering signature enforcement, event classification,
//! sleep evaluation, dispatch fan-out, and the acknowledgement contract.

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use siesta_api::{create_router, AppState, Config, Environment, WebhookVerifier};
use siesta_core::{
    Booking, BookingId, BookingRepository, BookingStatus, BookingUid, RealClock, Rescheduler,
    Result, SiestaError,
};
use siesta_dispatch::RescheduleDispatcher;
use tower::util::ServiceExt;

const TEST_SECRET: &str = "test-signing-secret";

#[derive(Default)]
struct FakeBookings {
    bookings: Vec<Booking>,
    lookups: AtomicUsize,
    fail: bool,
}

impl FakeBookings {
    fn with_bookings(bookings: Vec<Booking>) -> Self {
        Self { bookings, ..Self::default() }
    }

    fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BookingRepository for FakeBookings {
    async fn find_active_in_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>> {
        assert!(start <= end, "window start must not follow its end");
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SiestaError::BookingLookup("lookup refused".into()));
        }
        Ok(self.bookings.clone())
    }
}

#[derive(Default)]
struct FakeRescheduler {
    calls: Mutex<Vec<(String, String)>>,
    fail_uids: HashSet<String>,
}

impl FakeRescheduler {
    fn failing_for(uids: &[&str]) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_uids: uids.iter().map(|u| (*u).to_string()).collect(),
        }
    }

    fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Rescheduler for FakeRescheduler {
    async fn reschedule(&self, booking_uid: &BookingUid, reason: &str) -> Result<()> {
        self.calls.lock().unwrap().push((booking_uid.to_string(), reason.to_string()));
        if self.fail_uids.contains(booking_uid.as_str()) {
            return Err(SiestaError::Reschedule(format!("refused for {booking_uid}")));
        }
        Ok(())
    }
}

fn booking(id: i64, uid: &str, status: BookingStatus) -> Booking {
    Booking { id: BookingId::from(id), uid: BookingUid::from(uid), status }
}

fn test_config(environment: Environment) -> Config {
    let mut config = Config::default();
    config.webhook_secret = TEST_SECRET.to_string();
    config.environment = environment;
    config.reschedule_reason = "Can't do it".to_string();
    config
}

fn build_app(
    config: Config,
    bookings: Arc<FakeBookings>,
    rescheduler: Arc<FakeRescheduler>,
) -> Router {
    let verifier = WebhookVerifier::new(&config.webhook_secret).unwrap();
    let dispatcher =
        Arc::new(RescheduleDispatcher::new(rescheduler, config.to_dispatch_config()));
    let state = AppState::new(
        Arc::new(config),
        Arc::new(verifier),
        bookings,
        dispatcher,
        Arc::new(RealClock::new()),
    );
    create_router(state)
}

fn signed_request(payload: &Value) -> Request<Body> {
    let body = serde_json::to_vec(payload).unwrap();
    let verifier = WebhookVerifier::new(TEST_SECRET).unwrap();
    let timestamp = Utc::now().timestamp();
    let signature = verifier.sign("msg_test", timestamp, &body).unwrap();

    Request::builder()
        .method("POST")
        .uri("/webhooks/sleep")
        .header("content-type", "application/json")
        .header("svix-id", "msg_test")
        .header("svix-timestamp", timestamp.to_string())
        .header("svix-signature", signature)
        .body(Body::from(body))
        .unwrap()
}

fn sleep_event(duration_seconds: f64) -> Value {
    json!({
        "event_type": "daily.data.sleep.created",
        "data": {
            "id": "sleep_1",
            "user_id": "user_1",
            "duration": duration_seconds,
        }
    })
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn non_post_method_is_rejected() {
    let bookings = Arc::new(FakeBookings::default());
    let rescheduler = Arc::new(FakeRescheduler::default());
    let app = build_app(test_config(Environment::Sandbox), bookings.clone(), rescheduler.clone());

    let request =
        Request::builder().method("GET").uri("/webhooks/sleep").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(bookings.lookup_count(), 0);
    assert!(rescheduler.calls().is_empty());
}

#[tokio::test]
async fn missing_signature_header_is_rejected() {
    let bookings = Arc::new(FakeBookings::default());
    let rescheduler = Arc::new(FakeRescheduler::default());
    let app = build_app(test_config(Environment::Sandbox), bookings.clone(), rescheduler.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/sleep")
        .header("content-type", "application/json")
        .body(Body::from(sleep_event(3.0 * 3600.0).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["message"], "signature header missing");
    assert_eq!(bookings.lookup_count(), 0);
    assert!(rescheduler.calls().is_empty());
}

#[tokio::test]
async fn invalid_signature_is_rejected() {
    let bookings = Arc::new(FakeBookings::default());
    let rescheduler = Arc::new(FakeRescheduler::default());
    let app = build_app(test_config(Environment::Sandbox), bookings.clone(), rescheduler.clone());

    let payload = sleep_event(3.0 * 3600.0);
    let body = serde_json::to_vec(&payload).unwrap();
    let other_verifier = WebhookVerifier::new("some-other-secret").unwrap();
    let timestamp = Utc::now().timestamp();
    let signature = other_verifier.sign("msg_test", timestamp, &body).unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/sleep")
        .header("svix-id", "msg_test")
        .header("svix-timestamp", timestamp.to_string())
        .header("svix-signature", signature)
        .body(Body::from(body))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(rescheduler.calls().is_empty());
}

#[tokio::test]
async fn unknown_event_type_is_acknowledged_without_action() {
    let bookings = Arc::new(FakeBookings::with_bookings(vec![booking(
        1,
        "uid-a",
        BookingStatus::Accepted,
    )]));
    let rescheduler = Arc::new(FakeRescheduler::default());
    let app = build_app(test_config(Environment::Sandbox), bookings.clone(), rescheduler.clone());

    let payload = json!({
        "event_type": "daily.data.activity.created",
        "data": { "calories": 500 }
    });
    let response = app.oneshot(signed_request(&payload)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(bookings.lookup_count(), 0);
    assert!(rescheduler.calls().is_empty());
}

#[tokio::test]
async fn sufficient_sleep_does_not_touch_bookings() {
    let bookings = Arc::new(FakeBookings::with_bookings(vec![booking(
        1,
        "uid-a",
        BookingStatus::Accepted,
    )]));
    let rescheduler = Arc::new(FakeRescheduler::default());
    let app = build_app(test_config(Environment::Sandbox), bookings.clone(), rescheduler.clone());

    // Eight hours, comfortably above the five hour threshold.
    let response = app.oneshot(signed_request(&sleep_event(8.0 * 3600.0))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(bookings.lookup_count(), 0);
    assert!(rescheduler.calls().is_empty());
}

#[tokio::test]
async fn insufficient_sleep_reschedules_every_active_booking() {
    let bookings = Arc::new(FakeBookings::with_bookings(vec![
        booking(1, "uid-a", BookingStatus::Accepted),
        booking(2, "uid-b", BookingStatus::Pending),
        booking(3, "uid-c", BookingStatus::Accepted),
    ]));
    let rescheduler = Arc::new(FakeRescheduler::default());
    let app = build_app(test_config(Environment::Sandbox), bookings.clone(), rescheduler.clone());

    let response = app.oneshot(signed_request(&sleep_event(3.0 * 3600.0))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(bookings.lookup_count(), 1);

    let calls = rescheduler.calls();
    assert_eq!(calls.len(), 3);
    let uids: HashSet<_> = calls.iter().map(|(uid, _)| uid.clone()).collect();
    assert_eq!(uids, HashSet::from(["uid-a".into(), "uid-b".into(), "uid-c".into()]));
    assert!(calls.iter().all(|(_, reason)| reason == "Can't do it"));
}

#[tokio::test]
async fn missing_duration_is_treated_as_insufficient() {
    let bookings = Arc::new(FakeBookings::with_bookings(vec![booking(
        1,
        "uid-a",
        BookingStatus::Accepted,
    )]));
    let rescheduler = Arc::new(FakeRescheduler::default());
    let app = build_app(test_config(Environment::Sandbox), bookings.clone(), rescheduler.clone());

    let payload = json!({
        "event_type": "daily.data.sleep.created",
        "data": { "id": "sleep_1", "user_id": "user_1" }
    });
    let response = app.oneshot(signed_request(&payload)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(rescheduler.calls().len(), 1);
}

#[tokio::test]
async fn reschedule_failure_still_returns_ok_and_spares_siblings() {
    let bookings = Arc::new(FakeBookings::with_bookings(vec![
        booking(1, "uid-a", BookingStatus::Accepted),
        booking(2, "uid-b", BookingStatus::Accepted),
        booking(3, "uid-c", BookingStatus::Pending),
    ]));
    let rescheduler = Arc::new(FakeRescheduler::failing_for(&["uid-b"]));
    let app = build_app(test_config(Environment::Sandbox), bookings.clone(), rescheduler.clone());

    let response = app.oneshot(signed_request(&sleep_event(2.0 * 3600.0))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(rescheduler.calls().len(), 3);
}

#[tokio::test]
async fn booking_lookup_failure_still_returns_ok() {
    let bookings = Arc::new(FakeBookings { fail: true, ..FakeBookings::default() });
    let rescheduler = Arc::new(FakeRescheduler::default());
    let app = build_app(test_config(Environment::Sandbox), bookings.clone(), rescheduler.clone());

    let response = app.oneshot(signed_request(&sleep_event(3.0 * 3600.0))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(bookings.lookup_count(), 1);
    assert!(rescheduler.calls().is_empty());
}

#[tokio::test]
async fn empty_booking_window_dispatches_nothing() {
    let bookings = Arc::new(FakeBookings::default());
    let rescheduler = Arc::new(FakeRescheduler::default());
    let app = build_app(test_config(Environment::Sandbox), bookings.clone(), rescheduler.clone());

    let response = app.oneshot(signed_request(&sleep_event(3.0 * 3600.0))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(bookings.lookup_count(), 1);
    assert!(rescheduler.calls().is_empty());
}

#[tokio::test]
async fn acknowledgement_echoes_payload_verbatim() {
    let bookings = Arc::new(FakeBookings::default());
    let rescheduler = Arc::new(FakeRescheduler::default());
    let app = build_app(test_config(Environment::Sandbox), bookings, rescheduler);

    let payload = json!({
        "event_type": "daily.data.sleep.created",
        "data": { "duration": 14400.0, "nested": { "keep": ["me", 1, null] } }
    });
    let response = app.oneshot(signed_request(&payload)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body, json!({ "body": payload }));
}

#[tokio::test]
async fn error_stack_is_present_outside_production_only() {
    let bookings = Arc::new(FakeBookings::default());
    let rescheduler = Arc::new(FakeRescheduler::default());
    let sandbox_app =
        build_app(test_config(Environment::Sandbox), bookings.clone(), rescheduler.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/sleep")
        .body(Body::from("{}"))
        .unwrap();
    let body = response_json(sandbox_app.oneshot(request).await.unwrap()).await;
    assert!(body["stack"].is_string());

    let production_app = build_app(test_config(Environment::Production), bookings, rescheduler);
    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/sleep")
        .body(Body::from("{}"))
        .unwrap();
    let body = response_json(production_app.oneshot(request).await.unwrap()).await;
    assert_eq!(body["message"], "signature header missing");
    assert!(body.get("stack").is_none());
}

#[tokio::test]
async fn health_endpoints_respond() {
    let bookings = Arc::new(FakeBookings::default());
    let rescheduler = Arc::new(FakeRescheduler::default());
    let app = build_app(test_config(Environment::Sandbox), bookings, rescheduler);

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["environment"], "sandbox");

    let request = Request::builder().uri("/live").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
