use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    middleware::from_fn_with_state,
    routing::{delete, get},
};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::{dao::AuditLogFilter, entities::audit_log},
    error::AppError,
    middleware::require_audit_access,
    response::{ApiResult, MessageResponse},
    services::ServiceContext,
    state::AppState,
};

const DEFAULT_PAGE: u64 = 1;
const DEFAULT_PAGE_SIZE: u64 = 20;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogQuery {
    pub user_id: Option<String>,
    pub action: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

fn default_page() -> u64 {
    DEFAULT_PAGE
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl AuditLogQuery {
    fn filter(&self) -> Result<AuditLogFilter, AppError> {
        Ok(AuditLogFilter {
            user_id: non_blank(self.user_id.as_deref()),
            action: non_blank(self.action.as_deref()),
            from: parse_date("fromDate", self.from_date.as_deref())?,
            to: parse_date("toDate", self.to_date.as_deref())?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupQuery {
    pub older_than_days: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogListResponse {
    pub total_count: u64,
    pub page: u64,
    pub page_size: u64,
    pub data: Vec<audit_log::Model>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(list_logs))
        .route("/cleanup", delete(cleanup))
        .route("/{id}", get(get_log))
        .route_layer(from_fn_with_state(state.clone(), require_audit_access))
        .with_state(state)
}

async fn list_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AuditLogQuery>,
) -> ApiResult<AuditLogListResponse> {
    let filter = query.filter()?;
    let page = ServiceContext::from_state(&state)
        .audit()
        .list(&filter, query.page, query.page_size)
        .await?;

    Ok(Json(AuditLogListResponse {
        total_count: page.total,
        page: page.page,
        page_size: page.page_size,
        data: page.items,
    }))
}

async fn get_log(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<audit_log::Model> {
    let log = ServiceContext::from_state(&state).audit().get(&id).await?;
    Ok(Json(log))
}

async fn cleanup(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CleanupQuery>,
) -> ApiResult<MessageResponse> {
    let days = query
        .older_than_days
        .unwrap_or(state.config.audit.retention_days);
    let deleted = ServiceContext::from_state(&state)
        .audit()
        .cleanup(days)
        .await?;
    MessageResponse::ok(format!("Deleted {deleted} logs older than {days} days."))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Accepts RFC 3339, a naive date-time (read as UTC) or a plain date
/// (midnight UTC).
fn parse_date(field: &str, raw: Option<&str>) -> Result<Option<DateTime<FixedOffset>>, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(parsed));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Some(parsed.and_utc().fixed_offset()));
    }
    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(Some(midnight.and_utc().fixed_offset()));
    }

    Err(AppError::bad_request(format!(
        "{field} must be an ISO-8601 date or date-time"
    )))
}
