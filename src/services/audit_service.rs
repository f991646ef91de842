use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    db::dao::{AuditLogDao, AuditLogFilter, DaoLayerError},
    db::entities::audit_log,
    error::AppError,
};

pub const MAX_PAGE_SIZE: u64 = 100;

/// One page of audit entries plus the size of the whole filtered set.
#[derive(Debug, Clone)]
pub struct AuditPage {
    pub items: Vec<audit_log::Model>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

#[derive(Clone)]
pub struct AuditService {
    dao: AuditLogDao,
}

impl AuditService {
    pub fn new(dao: AuditLogDao) -> Self {
        Self { dao }
    }

    pub async fn record(
        &self,
        user_id: &str,
        action: &str,
        details: serde_json::Value,
    ) -> Result<audit_log::Model, DaoLayerError> {
        self.dao
            .record_at(user_id, action, details, Utc::now().fixed_offset())
            .await
    }

    pub async fn list(
        &self,
        filter: &AuditLogFilter,
        page: u64,
        page_size: u64,
    ) -> Result<AuditPage, AppError> {
        if page == 0 {
            return Err(AppError::bad_request("page must be at least 1"));
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(AppError::bad_request(format!(
                "pageSize must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        let offset = (page - 1).checked_mul(page_size);
        if offset.is_none_or(|offset| offset > i64::MAX as u64) {
            return Err(AppError::bad_request("page is out of range"));
        }

        let response = self
            .dao
            .list(filter, page, page_size)
            .await
            .map_err(|err| match err {
                DaoLayerError::InvalidPagination { .. } => AppError::from(err),
                other => AppError::internal_with_source("Error retrieving audit logs", other),
            })?;

        Ok(AuditPage {
            items: response.data,
            total: response.total.unwrap_or(0),
            page: response.page,
            page_size: response.page_size,
        })
    }

    pub async fn get(&self, id: &Uuid) -> Result<audit_log::Model, AppError> {
        self.dao
            .find_optional(id)
            .await
            .map_err(|err| AppError::internal_with_source("Error retrieving audit log", err))?
            .ok_or_else(|| AppError::not_found(format!("Audit log {id} not found")))
    }

    /// Deletes entries older than `older_than_days` days and returns how many
    /// were removed.
    pub async fn cleanup(&self, older_than_days: i64) -> Result<u64, AppError> {
        if older_than_days < 0 {
            return Err(AppError::bad_request("olderThanDays must not be negative"));
        }

        // An age past chrono's range puts the cutoff before any stored row.
        let Some(cutoff) = Duration::try_days(older_than_days)
            .and_then(|age| Utc::now().fixed_offset().checked_sub_signed(age))
        else {
            tracing::info!(
                older_than_days,
                "audit log cleanup cutoff out of range, nothing to delete"
            );
            return Ok(0);
        };
        let deleted = self
            .dao
            .delete_older_than(cutoff)
            .await
            .map_err(|err| AppError::internal_with_source("Error cleaning audit logs", err))?;
        tracing::info!(deleted, older_than_days, "audit log cleanup finished");
        Ok(deleted)
    }
}
