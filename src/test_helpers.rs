use std::{net::SocketAddr, sync::Arc, time::Duration as StdDuration};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    extract::ConnectInfo,
    http::{Method, Request, StatusCode, header},
};
use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    auth::bootstrap::build_credentials,
    config::AppConfig,
    db::{
        connection,
        entities::{refresh_token, user, user_role},
    },
    mail::{EmailError, EmailMessage, EmailQueue, EmailSender, RetryPolicy},
    routes::app,
    services::ServiceContext,
    state::AppState,
};

pub const TEST_JWT_SECRET: &str = "integration-test-secret";

pub fn ts() -> DateTime<FixedOffset> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .expect("valid timestamp")
        .fixed_offset()
}

pub fn user_model(id: Uuid, email: &str) -> user::Model {
    let now = ts();
    user::Model {
        id,
        created_at: now,
        updated_at: now,
        email: email.to_string(),
        password_hash: "hash".to_string(),
        full_name: "Alice Example".to_string(),
        last_login_at: None,
    }
}

pub fn user_role_model(user_id: Uuid, role: &str) -> user_role::Model {
    let now = ts();
    user_role::Model {
        id: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
        user_id,
        role: role.to_string(),
    }
}

pub fn refresh_token_model(token: &str, user_id: Uuid, revoked: bool) -> refresh_token::Model {
    let now = ts();
    refresh_token::Model {
        id: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
        token: token.to_string(),
        jwt_id: Uuid::new_v4().to_string(),
        user_id,
        expires_at: now + Duration::days(7),
        revoked,
    }
}

/// Config for an app backed by a private in-memory SQLite database.
pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.database.url = "sqlite::memory:".to_string();
    cfg.database.max_connections = 1;
    cfg.database.min_idle = 1;
    cfg.auth.jwt_secret = TEST_JWT_SECRET.to_string();
    cfg
}

/// Hands every delivered email to the paired receiver.
pub struct RecordingEmailSender(mpsc::UnboundedSender<EmailMessage>);

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let _ = self.0.send(message.clone());
        Ok(())
    }
}

pub fn recording_sender() -> (Arc<dyn EmailSender>, mpsc::UnboundedReceiver<EmailMessage>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(RecordingEmailSender(tx)), rx)
}

pub async fn test_state(cfg: AppConfig, sender: Arc<dyn EmailSender>) -> Arc<AppState> {
    let db = connection::connect(&cfg.database)
        .await
        .expect("connect to sqlite");
    let credentials = build_credentials(&cfg.auth, &ServiceContext::new(&db));
    let (mailer, _worker) = EmailQueue::spawn(
        sender,
        RetryPolicy {
            max_attempts: 1,
            base_delay: StdDuration::ZERO,
        },
        16,
    );
    AppState::new(cfg, db, credentials, mailer)
}

/// Full application over a fresh database, driven through `oneshot`.
#[derive(Clone)]
pub struct TestApp {
    pub state: Arc<AppState>,
    pub router: Router,
}

impl TestApp {
    pub async fn spawn(cfg: AppConfig, sender: Arc<dyn EmailSender>) -> Self {
        let state = test_state(cfg, sender).await;
        Self {
            router: app(state.clone()),
            state,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        bearer: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .extension(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request should build");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should read");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub async fn post(&self, uri: &str, body: Value, bearer: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body), bearer).await
    }

    pub async fn get(&self, uri: &str, bearer: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, bearer).await
    }

    pub async fn delete(&self, uri: &str, bearer: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None, bearer).await
    }
}
