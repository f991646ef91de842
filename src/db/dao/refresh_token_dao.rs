use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set,
};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::refresh_token::{self, Entity as RefreshToken};

#[derive(Clone)]
pub struct RefreshTokenDao {
    db: DatabaseConnection,
}

impl DaoBase for RefreshTokenDao {
    type Entity = RefreshToken;

    fn from_db(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl RefreshTokenDao {
    pub async fn create_refresh_token(
        &self,
        user_id: &Uuid,
        token: &str,
        jwt_id: &str,
        expires_at: DateTime<FixedOffset>,
    ) -> DaoResult<refresh_token::Model> {
        self.insert_with(&self.db, user_id, token, jwt_id, expires_at)
            .await
    }

    /// Inserts on an arbitrary connection so the write can join a transaction.
    pub async fn insert_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &Uuid,
        token: &str,
        jwt_id: &str,
        expires_at: DateTime<FixedOffset>,
    ) -> DaoResult<refresh_token::Model> {
        let now = Utc::now().fixed_offset();
        let model = refresh_token::ActiveModel {
            id: Set(Uuid::new_v4()),
            created_at: Set(now),
            updated_at: Set(now),
            token: Set(token.to_string()),
            jwt_id: Set(jwt_id.to_string()),
            user_id: Set(*user_id),
            expires_at: Set(expires_at),
            revoked: Set(false),
            ..Default::default()
        };
        model.insert(conn).await.map_err(DaoLayerError::Db)
    }

    pub async fn find_by_token(&self, token: &str) -> DaoResult<Option<refresh_token::Model>> {
        RefreshToken::find()
            .filter(refresh_token::Column::Token.eq(token))
            .one(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn find_for_user(
        &self,
        token: &str,
        user_id: &Uuid,
    ) -> DaoResult<Option<refresh_token::Model>> {
        RefreshToken::find()
            .filter(refresh_token::Column::Token.eq(token))
            .filter(refresh_token::Column::UserId.eq(*user_id))
            .one(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    /// Marks `token` revoked only if it is still active at `now`. Returns
    /// whether this call performed the revocation; of several concurrent
    /// callers at most one sees `true`.
    pub async fn revoke_if_active<C: ConnectionTrait>(
        &self,
        conn: &C,
        token: &str,
        now: DateTime<FixedOffset>,
    ) -> DaoResult<bool> {
        let result = RefreshToken::update_many()
            .col_expr(refresh_token::Column::Revoked, Expr::value(true))
            .col_expr(refresh_token::Column::UpdatedAt, Expr::value(now))
            .filter(refresh_token::Column::Token.eq(token))
            .filter(refresh_token::Column::Revoked.eq(false))
            .filter(refresh_token::Column::ExpiresAt.gt(now))
            .exec(conn)
            .await
            .map_err(DaoLayerError::Db)?;
        Ok(result.rows_affected > 0)
    }

    /// Revokes a token regardless of expiry. False when it was already revoked.
    pub async fn revoke(&self, id: &Uuid) -> DaoResult<bool> {
        let result = RefreshToken::update_many()
            .col_expr(refresh_token::Column::Revoked, Expr::value(true))
            .col_expr(
                refresh_token::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(refresh_token::Column::Id.eq(*id))
            .filter(refresh_token::Column::Revoked.eq(false))
            .exec(&self.db)
            .await
            .map_err(DaoLayerError::Db)?;
        Ok(result.rows_affected > 0)
    }

    pub async fn revoke_all_for_user(&self, user_id: &Uuid) -> DaoResult<u64> {
        let result = RefreshToken::update_many()
            .col_expr(refresh_token::Column::Revoked, Expr::value(true))
            .col_expr(
                refresh_token::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(refresh_token::Column::UserId.eq(*user_id))
            .filter(refresh_token::Column::Revoked.eq(false))
            .exec(&self.db)
            .await
            .map_err(DaoLayerError::Db)?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};
    use uuid::Uuid;

    use super::RefreshTokenDao;
    use crate::db::dao::{DaoBase, DaoLayerError};
    use crate::db::entities::refresh_token;
    use crate::test_helpers::{refresh_token_model, ts};

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[tokio::test]
    async fn find_by_token_returns_none_when_missing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<refresh_token::Model>::new()])
            .into_connection();
        let dao = RefreshTokenDao::new(&db);

        let result = dao
            .find_by_token("missing-token")
            .await
            .expect("query should succeed");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn find_for_user_returns_token_when_present() {
        let user_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[refresh_token_model("token-1", user_id, false)]])
            .into_connection();
        let dao = RefreshTokenDao::new(&db);

        let token = dao
            .find_for_user("token-1", &user_id)
            .await
            .expect("query should succeed")
            .expect("token should exist");
        assert_eq!(token.user_id, user_id);
        assert!(!token.revoked);
    }

    #[tokio::test]
    async fn revoke_if_active_reports_lost_race() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(1), exec(0)])
            .into_connection();
        let dao = RefreshTokenDao::new(&db);

        assert!(dao.revoke_if_active(&db, "token-1", ts()).await.expect("first"));
        assert!(!dao.revoke_if_active(&db, "token-1", ts()).await.expect("second"));
    }

    #[tokio::test]
    async fn revoke_all_for_user_returns_rows_affected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(3)])
            .into_connection();
        let dao = RefreshTokenDao::new(&db);

        let revoked = dao
            .revoke_all_for_user(&Uuid::new_v4())
            .await
            .expect("update should succeed");
        assert_eq!(revoked, 3);
    }

    #[tokio::test]
    async fn revoke_maps_database_errors() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_errors([DbErr::Custom("update failed".to_string())])
            .into_connection();
        let dao = RefreshTokenDao::new(&db);

        let err = dao
            .revoke(&Uuid::new_v4())
            .await
            .expect_err("update should fail");
        assert!(matches!(err, DaoLayerError::Db(_)));
    }
}
