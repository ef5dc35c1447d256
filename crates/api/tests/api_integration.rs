//! Integration tests for the API server.

use std::sync::Arc;
use std::sync::OnceLock;

use api::routes::bookings::AppState;
use api::routes::webhook;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use booking::{ChargeStatus, InMemoryPaymentGateway};
use chrono::NaiveDate;
use common::HotelId;
use domain::RoomType;
use metrics_exporter_prometheus::PrometheusHandle;
use store::{BookingStore, InMemoryBookingStore};
use tower::ServiceExt;

const WEBHOOK_SECRET: &str = "test-webhook-secret";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    app: axum::Router,
    store: InMemoryBookingStore,
    gateway: InMemoryPaymentGateway,
    #[allow(dead_code)]
    state: Arc<AppState<InMemoryBookingStore, InMemoryPaymentGateway>>,
}

fn setup() -> TestApp {
    let store = InMemoryBookingStore::new();
    let (state, gateway) = api::create_default_state(store.clone(), WEBHOOK_SECRET);
    let app = api::create_app(state.clone(), get_metrics_handle());
    TestApp {
        app,
        store,
        gateway,
        state,
    }
}

async fn seed_room_type(store: &InMemoryBookingStore, total: u32) -> RoomType {
    let rt = RoomType::new(HotelId::new(), "Deluxe King", 4, total, 1, 32);
    store.insert_room_type(&rt).await.unwrap();
    rt
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn guest_user_id() -> uuid::Uuid {
    uuid::Uuid::new_v4()
}

fn create_request(hotel_id: uuid::Uuid, user_id: uuid::Uuid, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/bookings/create/{hotel_id}"))
        .header("content-type", "application/json")
        .header("x-user-id", user_id.to_string())
        .header("x-user-email", "guest@example.com")
        .header("x-user-phone", "+2348000000000")
        .header("x-user-currency", "NGN")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn booking_body(rt: &RoomType, num_rooms: u32) -> serde_json::Value {
    serde_json::json!({
        "check_in_date": date(2999, 6, 1),
        "check_out_date": date(2999, 6, 5),
        "roomTypes": [{
            "roomtypeId": rt.id,
            "num_rooms": num_rooms,
            "num_guests": num_rooms * 2
        }],
        "total_price": 120000
    })
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let t = setup();

    let response = t
        .app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_create_booking() {
    let t = setup();
    let rt = seed_room_type(&t.store, 5).await;

    let response = t
        .app
        .oneshot(create_request(
            uuid::Uuid::new_v4(),
            guest_user_id(),
            booking_body(&rt, 2),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = json_body(response).await;
    assert!(json["checkout_url"].as_str().unwrap().starts_with("https://"));
    assert_eq!(json["booking"]["payment_status"], "pending");
    assert_eq!(json["booking_room_types"].as_array().unwrap().len(), 1);
    assert_eq!(json["summary"]["total_rooms"], 2);
    assert_eq!(json["summary"]["nights"], 4);

    assert_eq!(t.store.available_inventory(rt.id).await, Some(3));
}

#[tokio::test]
async fn test_create_booking_requires_identity_headers() {
    let t = setup();
    let rt = seed_room_type(&t.store, 5).await;

    let response = t
        .app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/bookings/create/{}", uuid::Uuid::new_v4()))
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_string(&booking_body(&rt, 1)).unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_booking_unavailable_returns_400() {
    let t = setup();
    let rt = seed_room_type(&t.store, 1).await;

    let response = t
        .app
        .oneshot(create_request(
            uuid::Uuid::new_v4(),
            guest_user_id(),
            booking_body(&rt, 3),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    let reason = json["error"].as_str().unwrap();
    assert!(reason.contains("requested 3"));
    assert!(reason.contains("total 1"));

    // Denied means nothing persisted.
    assert_eq!(t.store.booking_count().await, 0);
    assert_eq!(t.store.available_inventory(rt.id).await, Some(1));
}

#[tokio::test]
async fn test_create_booking_invalid_dates_returns_400() {
    let t = setup();
    let rt = seed_room_type(&t.store, 5).await;

    let body = serde_json::json!({
        "check_in_date": date(2999, 6, 5),
        "check_out_date": date(2999, 6, 1),
        "roomTypes": [{ "roomtypeId": rt.id, "num_rooms": 1, "num_guests": 2 }],
        "total_price": 120000
    });
    let response = t
        .app
        .oneshot(create_request(uuid::Uuid::new_v4(), guest_user_id(), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_then_get_booking() {
    let t = setup();
    let rt = seed_room_type(&t.store, 5).await;

    let created = t
        .app
        .clone()
        .oneshot(create_request(
            uuid::Uuid::new_v4(),
            guest_user_id(),
            booking_body(&rt, 1),
        ))
        .await
        .unwrap();
    let created_json = json_body(created).await;
    let booking_id = created_json["booking"]["id"].as_str().unwrap().to_string();

    let response = t
        .app
        .oneshot(
            Request::builder()
                .uri(format!("/bookings/{booking_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["booking"]["id"], booking_id.as_str());
    assert_eq!(json["booking_room_types"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_get_nonexistent_booking() {
    let t = setup();
    let fake_id = uuid::Uuid::new_v4();

    let response = t
        .app
        .oneshot(
            Request::builder()
                .uri(format!("/bookings/{fake_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_bookings_listing() {
    let t = setup();
    let rt = seed_room_type(&t.store, 5).await;
    let user_id = guest_user_id();

    t.app
        .clone()
        .oneshot(create_request(
            uuid::Uuid::new_v4(),
            user_id,
            booking_body(&rt, 1),
        ))
        .await
        .unwrap();

    let response = t
        .app
        .oneshot(
            Request::builder()
                .uri(format!("/bookings/user/{user_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_verify_payment_endpoint() {
    let t = setup();
    let rt = seed_room_type(&t.store, 5).await;

    let created = t
        .app
        .clone()
        .oneshot(create_request(
            uuid::Uuid::new_v4(),
            guest_user_id(),
            booking_body(&rt, 1),
        ))
        .await
        .unwrap();
    let created_json = json_body(created).await;
    let booking_id = created_json["booking"]["id"].as_str().unwrap().to_string();

    t.gateway.set_verify_status(ChargeStatus::Successful);
    let response = t
        .app
        .oneshot(
            Request::builder()
                .uri(format!("/bookings/{booking_id}/verify-payment"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["payment_status"], "completed");
}

#[tokio::test]
async fn test_cancel_booking_endpoint() {
    let t = setup();
    let rt = seed_room_type(&t.store, 5).await;

    let created = t
        .app
        .clone()
        .oneshot(create_request(
            uuid::Uuid::new_v4(),
            guest_user_id(),
            booking_body(&rt, 2),
        ))
        .await
        .unwrap();
    let created_json = json_body(created).await;
    let booking_id = created_json["booking"]["id"].as_str().unwrap().to_string();
    assert_eq!(t.store.available_inventory(rt.id).await, Some(3));

    let cancel = |app: axum::Router| {
        let booking_id = booking_id.clone();
        async move {
            app.oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri(format!("/bookings/cancel/{booking_id}"))
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({ "cancellation_reason": "change of plans" })
                            .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap()
        }
    };

    let response = cancel(t.app.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["cancelled"], true);
    assert_eq!(t.store.available_inventory(rt.id).await, Some(5));

    // Second cancel is a conflict and does not move inventory.
    let response = cancel(t.app).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(t.store.available_inventory(rt.id).await, Some(5));
}

#[tokio::test]
async fn test_update_booking_dates() {
    let t = setup();
    let rt = seed_room_type(&t.store, 5).await;

    let created = t
        .app
        .clone()
        .oneshot(create_request(
            uuid::Uuid::new_v4(),
            guest_user_id(),
            booking_body(&rt, 1),
        ))
        .await
        .unwrap();
    let created_json = json_body(created).await;
    let booking_id = created_json["booking"]["id"].as_str().unwrap().to_string();

    let response = t
        .app
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/bookings/{booking_id}"))
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "check_in_date": date(2999, 7, 1),
                        "check_out_date": date(2999, 7, 6)
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["check_in_date"], "2999-07-01");
    assert_eq!(json["check_out_date"], "2999-07-06");
}

#[tokio::test]
async fn test_webhook_valid_signature_completes_payment() {
    let t = setup();
    let rt = seed_room_type(&t.store, 5).await;

    let created = t
        .app
        .clone()
        .oneshot(create_request(
            uuid::Uuid::new_v4(),
            guest_user_id(),
            booking_body(&rt, 1),
        ))
        .await
        .unwrap();
    let created_json = json_body(created).await;
    let booking_id = created_json["booking"]["id"].as_str().unwrap().to_string();
    let tx_ref = created_json["booking"]["tx_ref"].as_str().unwrap().to_string();

    let payload = serde_json::json!({
        "event": "charge.completed",
        "data": { "tx_ref": tx_ref, "status": "successful", "currency": "NGN", "amount": 120000 }
    })
    .to_string();
    let signature = webhook::sign(WEBHOOK_SECRET, payload.as_bytes());

    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/payment")
                .header("content-type", "application/json")
                .header(webhook::SIGNATURE_HEADER, signature)
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    // The booking moved to completed via the verify operation.
    let get_response = t
        .app
        .oneshot(
            Request::builder()
                .uri(format!("/bookings/{booking_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = json_body(get_response).await;
    assert_eq!(json["booking"]["payment_status"], "completed");
}

#[tokio::test]
async fn test_webhook_invalid_signature_rejected() {
    let t = setup();

    let payload = serde_json::json!({
        "event": "charge.completed",
        "data": { "tx_ref": "TX-0001", "status": "successful" }
    })
    .to_string();

    let response = t
        .app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/payment")
                .header("content-type", "application/json")
                .header(webhook::SIGNATURE_HEADER, "deadbeef")
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_missing_signature_rejected() {
    let t = setup();

    let response = t
        .app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/payment")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_unknown_tx_ref_still_acknowledged() {
    let t = setup();

    let payload = serde_json::json!({
        "event": "charge.failed",
        "data": { "tx_ref": "TX-9999", "status": "failed" }
    })
    .to_string();
    let signature = webhook::sign(WEBHOOK_SECRET, payload.as_bytes());

    let response = t
        .app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/payment")
                .header("content-type", "application/json")
                .header(webhook::SIGNATURE_HEADER, signature)
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_booking_id_format() {
    let t = setup();

    let response = t
        .app
        .oneshot(
            Request::builder()
                .uri("/bookings/not-a-uuid")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
