use chrono::{DateTime, FixedOffset};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::password_reset_token::{self, Entity as PasswordResetToken};

#[derive(Clone)]
pub struct PasswordResetDao {
    db: DatabaseConnection,
}

impl DaoBase for PasswordResetDao {
    type Entity = PasswordResetToken;

    fn from_db(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl PasswordResetDao {
    pub async fn create_reset(
        &self,
        user_id: &Uuid,
        token_hash: &str,
        expires_at: DateTime<FixedOffset>,
    ) -> DaoResult<password_reset_token::Model> {
        let model = password_reset_token::ActiveModel {
            token_hash: Set(token_hash.to_string()),
            user_id: Set(*user_id),
            expires_at: Set(expires_at),
            used: Set(false),
            ..Default::default()
        };
        self.create(model).await
    }

    /// Marks the matching unused, unexpired code as used. False when no such
    /// code exists for the user.
    pub async fn consume(
        &self,
        user_id: &Uuid,
        token_hash: &str,
        now: DateTime<FixedOffset>,
    ) -> DaoResult<bool> {
        let result = PasswordResetToken::update_many()
            .col_expr(password_reset_token::Column::Used, Expr::value(true))
            .col_expr(password_reset_token::Column::UpdatedAt, Expr::value(now))
            .filter(password_reset_token::Column::UserId.eq(*user_id))
            .filter(password_reset_token::Column::TokenHash.eq(token_hash))
            .filter(password_reset_token::Column::Used.eq(false))
            .filter(password_reset_token::Column::ExpiresAt.gt(now))
            .exec(&self.db)
            .await
            .map_err(DaoLayerError::Db)?;
        Ok(result.rows_affected > 0)
    }
}
