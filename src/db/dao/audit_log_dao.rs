use chrono::{DateTime, FixedOffset};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter, Set,
};
use uuid::Uuid;

use super::{ColumnFilter, CompareOp, DaoBase, DaoLayerError, DaoResult, PaginatedResponse};
use crate::db::entities::audit_log::{self, Entity as AuditLog};

/// Optional criteria for listing audit entries. All set fields must match.
#[derive(Debug, Clone, Default)]
pub struct AuditLogFilter {
    pub user_id: Option<String>,
    /// Substring of the `"{METHOD} {path}"` action.
    pub action: Option<String>,
    pub from: Option<DateTime<FixedOffset>>,
    pub to: Option<DateTime<FixedOffset>>,
}

impl AuditLogFilter {
    fn columns(&self) -> Vec<ColumnFilter<audit_log::Column>> {
        let mut filters = Vec::new();
        if let Some(user_id) = &self.user_id {
            filters.push(ColumnFilter::eq(audit_log::Column::UserId, user_id.clone()));
        }
        if let Some(action) = &self.action {
            filters.push(ColumnFilter::contains(audit_log::Column::Action, action));
        }
        if let Some(from) = self.from {
            filters.push(ColumnFilter::compare(
                audit_log::Column::Timestamp,
                CompareOp::Gte,
                from,
            ));
        }
        if let Some(to) = self.to {
            filters.push(ColumnFilter::compare(
                audit_log::Column::Timestamp,
                CompareOp::Lte,
                to,
            ));
        }
        filters
    }
}

#[derive(Clone)]
pub struct AuditLogDao {
    db: DatabaseConnection,
}

impl DaoBase for AuditLogDao {
    type Entity = AuditLog;

    fn from_db(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl AuditLogDao {
    pub async fn record_at(
        &self,
        user_id: &str,
        action: &str,
        details: serde_json::Value,
        timestamp: DateTime<FixedOffset>,
    ) -> DaoResult<audit_log::Model> {
        let model = audit_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id.to_string()),
            action: Set(action.to_string()),
            details: Set(details),
            timestamp: Set(timestamp),
            ..Default::default()
        };
        model.insert(&self.db).await.map_err(DaoLayerError::Db)
    }

    /// Newest first.
    pub async fn list(
        &self,
        filter: &AuditLogFilter,
        page: u64,
        page_size: u64,
    ) -> DaoResult<PaginatedResponse<audit_log::Model>> {
        self.find_with_filters(
            page,
            page_size,
            Some((audit_log::Column::Timestamp, Order::Desc)),
            &filter.columns(),
        )
        .await
    }

    pub async fn find_optional(&self, id: &Uuid) -> DaoResult<Option<audit_log::Model>> {
        AuditLog::find_by_id(*id)
            .one(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    /// Deletes entries strictly older than `cutoff`.
    pub async fn delete_older_than(&self, cutoff: DateTime<FixedOffset>) -> DaoResult<u64> {
        let result = AuditLog::delete_many()
            .filter(audit_log::Column::Timestamp.lt(cutoff))
            .exec(&self.db)
            .await
            .map_err(DaoLayerError::Db)?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};

    use super::{AuditLogDao, AuditLogFilter};
    use crate::db::dao::{DaoBase, DaoLayerError, FilterOp};
    use crate::test_helpers::ts;

    #[test]
    fn filter_builds_one_column_filter_per_criterion() {
        let filter = AuditLogFilter {
            user_id: Some("u-1".to_string()),
            action: Some("POST".to_string()),
            from: Some(ts()),
            to: None,
        };

        let columns = filter.columns();
        assert_eq!(columns.len(), 3);
        assert!(matches!(columns[0].op, FilterOp::Eq(_)));
        assert!(matches!(&columns[1].op, FilterOp::Like { pattern, .. } if pattern == "%POST%"));
        assert!(matches!(columns[2].op, FilterOp::Compare { .. }));
    }

    #[tokio::test]
    async fn list_rejects_oversized_pages() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let dao = AuditLogDao::new(&db);

        let err = dao
            .list(&AuditLogFilter::default(), 1, 101)
            .await
            .expect_err("page size should be rejected");
        assert!(matches!(
            err,
            DaoLayerError::InvalidPagination { page: 1, page_size: 101 }
        ));
    }

    #[tokio::test]
    async fn delete_older_than_returns_deleted_count() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 7,
            }])
            .into_connection();
        let dao = AuditLogDao::new(&db);

        let deleted = dao.delete_older_than(ts()).await.expect("delete should succeed");
        assert_eq!(deleted, 7);
    }

    #[tokio::test]
    async fn delete_older_than_maps_database_errors() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_errors([DbErr::Custom("delete failed".to_string())])
            .into_connection();
        let dao = AuditLogDao::new(&db);

        let err = dao.delete_older_than(ts()).await.expect_err("delete should fail");
        assert!(matches!(err, DaoLayerError::Db(_)));
    }
}
