use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use smartpark_backend::config::EnvironmentConfig;
use smartpark_backend::repositories::MemoryStore;
use smartpark_backend::routes::create_app_router;
use smartpark_backend::services::ManualClock;
use smartpark_backend::state::AppState;
use smartpark_backend::utils::jwt::issue_token;

const SECRET: &str = "test-secret";

struct TestApp {
    router: Router,
    clock: Arc<ManualClock>,
    token: String,
}

fn create_test_app() -> TestApp {
    let config = EnvironmentConfig::from_lookup(|key| match key {
        "JWT_SECRET" => Some(SECRET.to_string()),
        _ => None,
    })
    .unwrap();
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()));
    let state = AppState::new(Arc::new(MemoryStore::new()), clock.clone(), config);
    let token = issue_token(Uuid::new_v4(), "operator", SECRET, Utc::now(), Duration::hours(1)).unwrap();

    TestApp {
        router: create_app_router(state),
        clock,
        token,
    }
}

impl TestApp {
    async fn send(&self, method: &str, uri: &str, body: Option<Value>, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn authed(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(method, uri, body, Some(&self.token)).await
    }
}

#[tokio::test]
async fn test_health_check_is_public() {
    let app = create_test_app();
    let (status, body) = app.send("GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_api_requires_token() {
    let app = create_test_app();

    let (status, body) = app.send("GET", "/api/slots", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app.send("GET", "/api/slots", None, Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let foreign = issue_token(Uuid::new_v4(), "intruder", "other-secret", Utc::now(), Duration::hours(1)).unwrap();
    let (status, _) = app.send("GET", "/api/slots", None, Some(&foreign)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_entry_exit_and_payment_over_http() {
    let app = create_test_app();

    let (status, body) = app
        .authed("POST", "/api/slots", Some(json!({ "slot_number": "A1", "hourly_rate": "1000" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["slot_status"], "available");

    let (status, body) = app
        .authed(
            "POST",
            "/api/parking/entry",
            Some(json!({
                "plate_number": "RAB123A",
                "slot_number": "A1",
                "driver_name": "Jean Mugabo",
                "phone_number": "0788123456"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let record_id = body["data"]["record_id"].as_i64().unwrap();

    let (status, body) = app
        .authed(
            "POST",
            "/api/parking/entry",
            Some(json!({ "plate_number": "RAC456B", "slot_number": "A1" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "SLOT_UNAVAILABLE");

    app.clock.advance(Duration::minutes(90));
    let (status, body) = app
        .authed("PUT", &format!("/api/parking/exit/{}", record_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["duration_minutes"], 90);
    assert_eq!(body["data"]["status"], "completed");

    let (status, body) = app
        .authed("PUT", &format!("/api/parking/exit/{}", record_id), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "SESSION_NOT_ACTIVE");

    let (status, body) = app
        .authed(
            "POST",
            "/api/payments",
            Some(json!({ "record_id": record_id, "amount_paid": "1500" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INSUFFICIENT_PAYMENT");

    let (status, body) = app
        .authed(
            "POST",
            "/api/payments",
            Some(json!({ "record_id": record_id, "amount_paid": "2000", "payment_method": "card" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["payment_method"], "card");
    let payment_id = body["data"]["payment_id"].as_i64().unwrap();

    let (status, body) = app
        .authed("GET", &format!("/api/payments/{}/invoice", payment_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["parking"]["duration"], "1h 30m");

    let (status, body) = app.authed("GET", "/api/parking/revenue/2024-03-01", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_parkings"], 1);
}

#[tokio::test]
async fn test_invalid_input_is_rejected() {
    let app = create_test_app();

    let (status, body) = app
        .authed(
            "POST",
            "/api/parking/entry",
            Some(json!({ "plate_number": "RAB 123A", "slot_number": "A1" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app.authed("GET", "/api/parking/revenue/yesterday", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, body) = app.authed("GET", "/api/slots/Z9", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_malformed_exit_body_keeps_session_open() {
    let app = create_test_app();
    app.authed("POST", "/api/slots", Some(json!({ "slot_number": "A1", "hourly_rate": "1000" })))
        .await;
    let (_, body) = app
        .authed(
            "POST",
            "/api/parking/entry",
            Some(json!({
                "plate_number": "RAB123A",
                "slot_number": "A1",
                "driver_name": "Jean Mugabo",
                "phone_number": "0788123456"
            })),
        )
        .await;
    let record_id = body["data"]["record_id"].as_i64().unwrap();
    app.clock.advance(Duration::minutes(30));

    let (status, body) = app
        .authed(
            "PUT",
            &format!("/api/parking/exit/{}", record_id),
            Some(json!({ "exit_time": "not-a-timestamp" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, body) = app
        .authed("GET", &format!("/api/parking/records/{}", record_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "active");
    assert!(body["data"]["exit_time"].is_null());

    let (_, body) = app.authed("GET", "/api/slots/A1", None).await;
    assert_eq!(body["data"]["slot_status"], "occupied");

    let (status, body) = app
        .authed(
            "PUT",
            &format!("/api/parking/exit/{}", record_id),
            Some(json!({ "exit_time": "2024-03-01T09:15:00Z" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["duration_minutes"], 75);
    assert_eq!(body["data"]["total_amount"], "2000");
}
