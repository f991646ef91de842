use std::{net::SocketAddr, sync::Arc, time::Instant};

use axum::{
    body::{Body, Bytes, HttpBody, to_bytes},
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use super::guards::bearer_token;
use crate::{auth::ANONYMOUS, services::ServiceContext, state::AppState};

pub const REDACTED: &str = "***REDACTED***";

const SENSITIVE_KEYS: [&str; 5] = [
    "password",
    "newpassword",
    "confirmPassword",
    "token",
    "refreshToken",
];
const REQUEST_TEXT_LIMIT: usize = 400;
const RESPONSE_TEXT_LIMIT: usize = 800;
/// Largest body the interceptor buffers for recording. Matches axum's default
/// request body limit.
pub const BODY_CAPTURE_LIMIT: usize = 2 * 1024 * 1024;

/// Shape of the `details` column of every audit row.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct AuditDetails {
    #[serde(rename = "IP")]
    ip: Option<String>,
    status_code: u16,
    duration_ms: u64,
    request: String,
    response: String,
}

/// Records one audit row per request. Recording failures are logged and never
/// change the response the client sees.
pub async fn audit_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    let (mut parts, body) = req.into_parts();
    let user_id = match bearer_token(&parts).map(|token| state.tokens.verify(token)) {
        Some(Ok(claims)) => {
            let user_id = claims.actor_id().to_string();
            parts.extensions.insert(claims);
            user_id
        }
        _ => ANONYMOUS.to_string(),
    };

    let (body, request_text) = if is_json(&parts.headers) {
        match capture_body(body, BODY_CAPTURE_LIMIT).await {
            Ok((body, Some(bytes))) => (
                body,
                sanitize_request_body(&String::from_utf8_lossy(&bytes)),
            ),
            Ok((body, None)) => (body, String::new()),
            Err(err) => {
                warn!(%method, %path, error = %err, "failed to buffer request body");
                (Body::empty(), String::new())
            }
        }
    } else {
        (body, String::new())
    };

    let response = next.run(Request::from_parts(parts, body)).await;

    let (mut res_parts, res_body) = response.into_parts();
    let (res_body, response_bytes) = match capture_body(res_body, BODY_CAPTURE_LIMIT).await {
        Ok(captured) => captured,
        Err(err) => {
            error!(%method, %path, error = %err, "failed to buffer response body, not audited");
            res_parts.headers.remove(header::CONTENT_LENGTH);
            return Response::from_parts(res_parts, Body::empty());
        }
    };

    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let status = res_parts.status.as_u16();
    let details = AuditDetails {
        ip,
        status_code: status,
        duration_ms,
        request: request_text,
        response: response_bytes
            .map(|bytes| response_text(&res_parts.headers, &bytes))
            .unwrap_or_default(),
    };
    let action = format!("{method} {path}");

    match serde_json::to_value(&details) {
        Ok(details) => {
            let audit = ServiceContext::from_state(&state).audit();
            if let Err(err) = audit.record(&user_id, &action, details).await {
                error!(%action, error = %err, "failed to persist audit log");
            }
        }
        Err(err) => error!(%action, error = %err, "failed to serialize audit details"),
    }
    info!("AUDIT: {method} {path} by {user_id} => {status} ({duration_ms} ms)");

    Response::from_parts(res_parts, res_body)
}

/// Buffers `body` when its size is known to be within `limit` and hands back
/// an equivalent body. Larger or unsized bodies pass through untouched with no
/// captured bytes.
async fn capture_body(body: Body, limit: usize) -> Result<(Body, Option<Bytes>), axum::Error> {
    let fits = body
        .size_hint()
        .upper()
        .is_some_and(|size| size <= limit as u64);
    if !fits {
        return Ok((body, None));
    }

    let bytes = to_bytes(body, limit).await?;
    Ok((Body::from(bytes.clone()), Some(bytes)))
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_ascii_lowercase().contains("application/json"))
        .unwrap_or(false)
}

/// Redacted copy of a JSON object body. Anything that is not a JSON object is
/// truncated to 400 characters instead.
pub fn sanitize_request_body(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(mut value @ Value::Object(_)) => {
            redact(&mut value);
            value.to_string()
        }
        _ => truncate(raw, REQUEST_TEXT_LIMIT),
    }
}

fn response_text(headers: &HeaderMap, bytes: &[u8]) -> String {
    let raw = String::from_utf8_lossy(bytes);
    if is_json(headers) {
        if let Ok(mut value) = serde_json::from_slice::<Value>(bytes) {
            redact(&mut value);
            return truncate(&value.to_string(), RESPONSE_TEXT_LIMIT);
        }
    }
    truncate(&raw, RESPONSE_TEXT_LIMIT)
}

fn redact(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, value) in map.iter_mut() {
                if is_sensitive(key) {
                    *value = Value::String(REDACTED.to_string());
                } else {
                    redact(value);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact),
        _ => {}
    }
}

fn is_sensitive(key: &str) -> bool {
    SENSITIVE_KEYS
        .iter()
        .any(|sensitive| sensitive.eq_ignore_ascii_case(key))
}

fn truncate(input: &str, max_chars: usize) -> String {
    match input.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &input[..cut]),
        None => input.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{HeaderMap, HeaderValue, header};
    use serde_json::{Value, json};

    use super::{
        AuditDetails, BODY_CAPTURE_LIMIT, REDACTED, capture_body, response_text,
        sanitize_request_body, truncate,
    };

    fn parse(text: &str) -> Value {
        serde_json::from_str(text).expect("sanitized body should stay json")
    }

    #[test]
    fn redacts_password_and_keeps_email() {
        let sanitized = parse(&sanitize_request_body(
            r#"{"email":"a@b.com","password":"secret"}"#,
        ));
        assert_eq!(sanitized["email"], "a@b.com");
        assert_eq!(sanitized["password"], REDACTED);
    }

    #[test]
    fn redaction_ignores_key_case_and_nesting() {
        let sanitized = parse(&sanitize_request_body(
            r#"{"newPassword":"n","TOKEN":"t","profile":{"confirmPassword":"c","name":"x"},"items":[{"refreshToken":"r"}]}"#,
        ));
        assert_eq!(sanitized["newPassword"], REDACTED);
        assert_eq!(sanitized["TOKEN"], REDACTED);
        assert_eq!(sanitized["profile"]["confirmPassword"], REDACTED);
        assert_eq!(sanitized["profile"]["name"], "x");
        assert_eq!(sanitized["items"][0]["refreshToken"], REDACTED);
    }

    #[test]
    fn non_object_bodies_are_truncated() {
        let raw = "x".repeat(450);
        let sanitized = sanitize_request_body(&raw);
        assert_eq!(sanitized.len(), 403);
        assert!(sanitized.ends_with("..."));

        assert_eq!(sanitize_request_body("[1,2]"), "[1,2]");
        assert_eq!(sanitize_request_body("  "), "");
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("héllo", 5), "héllo");
        assert_eq!(truncate("héllo", 2), "hé...");
    }

    #[test]
    fn json_responses_are_redacted_before_truncation() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let body = json!({"token": "jwt", "refreshToken": "opaque", "expires": "later"}).to_string();

        let text = parse(&response_text(&headers, body.as_bytes()));
        assert_eq!(text["token"], REDACTED);
        assert_eq!(text["refreshToken"], REDACTED);
        assert_eq!(text["expires"], "later");

        let long = "y".repeat(900);
        let text = response_text(&HeaderMap::new(), long.as_bytes());
        assert_eq!(text.chars().count(), 803);
    }

    #[tokio::test]
    async fn capture_keeps_small_bodies_readable() {
        let (body, captured) = capture_body(Body::from("{\"a\":1}"), 64)
            .await
            .expect("capture should succeed");
        assert_eq!(captured.as_deref(), Some(&b"{\"a\":1}"[..]));
        let forwarded = to_bytes(body, usize::MAX).await.expect("forwarded body");
        assert_eq!(&forwarded[..], b"{\"a\":1}");
    }

    #[tokio::test]
    async fn capture_passes_oversized_bodies_through() {
        let payload = "z".repeat(100);
        let (body, captured) = capture_body(Body::from(payload.clone()), 64)
            .await
            .expect("capture should succeed");
        assert!(captured.is_none());
        let forwarded = to_bytes(body, usize::MAX).await.expect("forwarded body");
        assert_eq!(forwarded.len(), payload.len());
    }

    #[tokio::test]
    async fn capture_leaves_failing_streams_to_the_reader() {
        let chunks = futures_util::stream::iter(vec![
            Ok::<_, std::io::Error>("{\"a\":"),
            Err(std::io::Error::other("connection reset")),
        ]);
        let (body, captured) = capture_body(Body::from_stream(chunks), BODY_CAPTURE_LIMIT)
            .await
            .expect("capture should not read a stream of unknown size");
        assert!(captured.is_none());
        assert!(to_bytes(body, usize::MAX).await.is_err());
    }

    #[test]
    fn details_use_pascal_case_keys() {
        let details = serde_json::to_value(AuditDetails {
            ip: Some("127.0.0.1".to_string()),
            status_code: 200,
            duration_ms: 12,
            request: String::new(),
            response: "ok".to_string(),
        })
        .expect("details serialize");

        assert_eq!(
            details,
            json!({
                "IP": "127.0.0.1",
                "StatusCode": 200,
                "DurationMs": 12,
                "Request": "",
                "Response": "ok"
            })
        );
    }
}
