use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use serde_json::{Value, json};

use resource_booking::{
    config::AppConfig,
    mail::LogEmailSender,
    middleware::{BODY_CAPTURE_LIMIT, REDACTED},
    services::ServiceContext,
    test_helpers::{TestApp, test_config},
};

fn day(n: u32) -> DateTime<FixedOffset> {
    Utc.with_ymd_and_hms(2024, 1, n, 0, 0, 0)
        .single()
        .expect("valid date")
        .fixed_offset()
}

async fn app_with(cfg: AppConfig) -> TestApp {
    TestApp::spawn(cfg, Arc::new(LogEmailSender)).await
}

/// App with the interceptor off so only seeded rows exist.
async fn quiet_app() -> TestApp {
    let mut cfg = test_config();
    cfg.audit.enabled = false;
    app_with(cfg).await
}

async fn seed_three(app: &TestApp) {
    let dao = ServiceContext::from_state(&app.state).daos().audit_log();
    for (user, action, at) in [
        ("u1", "GET /api/resources", day(1)),
        ("u2", "POST /api/auth/login", day(2)),
        ("u1", "POST /api/auth/register", day(3)),
    ] {
        dao.record_at(user, action, json!({"StatusCode": 200}), at)
            .await
            .expect("seed row");
    }
}

fn actions(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .expect("data should be an array")
        .iter()
        .map(|row| row["action"].as_str().expect("action").to_string())
        .collect()
}

#[tokio::test]
async fn list_filters_are_conjunctive_and_newest_first() {
    let app = quiet_app().await;
    seed_three(&app).await;

    let (status, body) = app.get("/api/auditlogs", None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["totalCount"], 3);
    assert_eq!(body["page"], 1);
    assert_eq!(body["pageSize"], 20);
    assert_eq!(
        actions(&body),
        vec!["POST /api/auth/register", "POST /api/auth/login", "GET /api/resources"]
    );

    let (_, body) = app.get("/api/auditlogs?fromDate=2024-01-02", None).await;
    assert_eq!(body["totalCount"], 2);
    assert!(!actions(&body).contains(&"GET /api/resources".to_string()));

    let (_, body) = app
        .get("/api/auditlogs?toDate=2024-01-02T00:00:00Z", None)
        .await;
    assert_eq!(
        actions(&body),
        vec!["POST /api/auth/login", "GET /api/resources"]
    );

    let (_, body) = app.get("/api/auditlogs?userId=u1", None).await;
    assert_eq!(body["totalCount"], 2);

    let (_, body) = app.get("/api/auditlogs?userId=u", None).await;
    assert_eq!(body["totalCount"], 0);

    let (_, body) = app.get("/api/auditlogs?action=login", None).await;
    assert_eq!(actions(&body), vec!["POST /api/auth/login"]);

    let (_, body) = app
        .get("/api/auditlogs?userId=u1&action=POST", None)
        .await;
    assert_eq!(actions(&body), vec!["POST /api/auth/register"]);
}

#[tokio::test]
async fn list_paginates_with_total_of_filtered_set() {
    let app = quiet_app().await;
    seed_three(&app).await;

    let (status, body) = app.get("/api/auditlogs?page=2&pageSize=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalCount"], 3);
    assert_eq!(body["page"], 2);
    assert_eq!(body["pageSize"], 2);
    assert_eq!(actions(&body), vec!["GET /api/resources"]);

    let (status, _) = app.get("/api/auditlogs?pageSize=101", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.get("/api/auditlogs?fromDate=soon", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().expect("message").starts_with("fromDate"));
}

#[tokio::test]
async fn get_by_id_and_not_found() {
    let app = quiet_app().await;
    let dao = ServiceContext::from_state(&app.state).daos().audit_log();
    let row = dao
        .record_at("u1", "GET /api/x", json!({"IP": "10.0.0.1"}), day(5))
        .await
        .expect("seed row");

    let (status, body) = app.get(&format!("/api/auditlogs/{}", row.id), None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["id"], row.id.to_string());
    assert_eq!(body["userId"], "u1");
    assert_eq!(body["details"]["IP"], "10.0.0.1");

    let missing = uuid::Uuid::new_v4();
    let (status, body) = app.get(&format!("/api/auditlogs/{missing}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], format!("Audit log {missing} not found"));

    let (status, body) = app.get("/api/auditlogs/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn cleanup_deletes_old_rows_and_is_idempotent() {
    let app = quiet_app().await;
    let dao = ServiceContext::from_state(&app.state).daos().audit_log();
    let now = Utc::now().fixed_offset();
    for age in [1, 40, 200] {
        dao.record_at("u1", "GET /api/x", json!({}), now - Duration::days(age))
            .await
            .expect("seed row");
    }

    let (status, body) = app.delete("/api/auditlogs/cleanup", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Deleted 1 logs older than 90 days.");

    let (_, body) = app.delete("/api/auditlogs/cleanup?olderThanDays=0", None).await;
    assert_eq!(body["message"], "Deleted 2 logs older than 0 days.");

    let (_, body) = app.delete("/api/auditlogs/cleanup?olderThanDays=0", None).await;
    assert_eq!(body["message"], "Deleted 0 logs older than 0 days.");

    let (status, _) = app
        .delete("/api/auditlogs/cleanup?olderThanDays=-3", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn huge_integer_parameters_are_answered_not_crashed() {
    let app = quiet_app().await;
    seed_three(&app).await;

    let (status, body) = app
        .delete("/api/auditlogs/cleanup?olderThanDays=1000000000", None)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Deleted 0 logs older than 1000000000 days.");

    let (status, body) = app
        .delete(
            &format!("/api/auditlogs/cleanup?olderThanDays={}", i64::MAX),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, body) = app
        .get("/api/auditlogs?page=100000000000000000&pageSize=100", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["message"], "page is out of range");

    let (_, body) = app.get("/api/auditlogs", None).await;
    assert_eq!(body["totalCount"], 3);
}

#[tokio::test]
async fn interceptor_records_sanitized_requests() {
    let app = app_with(test_config()).await;

    let (status, _) = app
        .post(
            "/api/auth/register",
            json!({"email": "a@b.com", "password": "secret", "fullName": "A B"}),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, login) = app
        .post(
            "/api/auth/login",
            json!({"email": "a@b.com", "password": "secret"}),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let user_id = login["userData"]["id"].as_str().expect("user id").to_string();
    let access = login["token"].as_str().expect("token").to_string();

    let (_, body) = app
        .get("/api/auditlogs?action=POST%20%2Fapi%2Fauth%2Fregister", None)
        .await;
    assert_eq!(body["totalCount"], 1, "{body}");
    let entry = &body["data"][0];
    assert_eq!(entry["userId"], "Anonymous");
    let details = &entry["details"];
    assert_eq!(details["StatusCode"], 200);
    assert_eq!(details["IP"], "127.0.0.1");
    assert!(details["DurationMs"].is_u64());
    let request: Value = serde_json::from_str(details["Request"].as_str().expect("request text"))
        .expect("request text should be json");
    assert_eq!(request["email"], "a@b.com");
    assert_eq!(request["password"], REDACTED);

    let (_, body) = app.get("/api/auditlogs?action=auth%2Flogin", None).await;
    let response_text = body["data"][0]["details"]["Response"]
        .as_str()
        .expect("response text");
    assert!(!response_text.contains(&access));
    assert!(response_text.contains(REDACTED));

    let (status, _) = app.post("/api/auth/logout-all", json!({}), Some(&access)).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app
        .get(&format!("/api/auditlogs?userId={user_id}"), None)
        .await;
    assert_eq!(body["totalCount"], 1);
    assert_eq!(body["data"][0]["action"], "POST /api/auth/logout-all");
}

#[tokio::test]
async fn interceptor_records_failed_requests_too() {
    let app = app_with(test_config()).await;

    let (status, _) = app
        .post("/api/auth/login", json!({"email": "x@y.com", "password": "nope"}), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, body) = app.get("/api/auditlogs?action=login", None).await;
    assert_eq!(body["data"][0]["details"]["StatusCode"], 401);
}

#[tokio::test]
async fn interceptor_skips_bodies_over_the_capture_limit() {
    let app = app_with(test_config()).await;
    let padding = "p".repeat(BODY_CAPTURE_LIMIT + 1024);

    let (status, body) = app
        .post(
            "/api/auth/login",
            json!({"email": "big@x.com", "password": "secret", "padding": padding}),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE, "{body}");

    let (_, body) = app.get("/api/auditlogs?action=login", None).await;
    assert_eq!(body["totalCount"], 1);
    let details = &body["data"][0]["details"];
    assert_eq!(details["StatusCode"], 413);
    assert_eq!(details["Request"], "");
}

#[tokio::test]
async fn admin_role_required_when_configured() {
    let mut cfg = test_config();
    cfg.audit.enabled = false;
    cfg.audit.require_admin = true;
    cfg.auth.seed_admin_email = Some("admin@x.com".to_string());
    cfg.auth.seed_admin_password = Some("AdminPass1".to_string());
    let app = app_with(cfg.clone()).await;
    resource_booking::auth::bootstrap::seed_admin(
        &cfg.auth,
        &ServiceContext::from_state(&app.state),
        app.state.credentials.as_ref(),
    )
    .await
    .expect("seed admin");

    let (status, _) = app.get("/api/auditlogs", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    app.post(
        "/api/auth/register",
        json!({"email": "emp@x.com", "password": "Pass123", "fullName": "E"}),
        None,
    )
    .await;
    let (_, employee) = app
        .post("/api/auth/login", json!({"email": "emp@x.com", "password": "Pass123"}), None)
        .await;
    let (status, body) = app
        .get("/api/auditlogs", employee["token"].as_str())
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Missing required role");

    let (_, admin) = app
        .post("/api/auth/login", json!({"email": "admin@x.com", "password": "AdminPass1"}), None)
        .await;
    let (status, _) = app.get("/api/auditlogs", admin["token"].as_str()).await;
    assert_eq!(status, StatusCode::OK);
}
