use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::{prelude::UserRole, user_role};

#[derive(Clone)]
pub struct UserRoleDao {
    db: DatabaseConnection,
}

impl DaoBase for UserRoleDao {
    type Entity = UserRole;

    fn from_db(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl UserRoleDao {
    pub async fn roles_for(&self, user_id: &Uuid) -> DaoResult<Vec<String>> {
        let rows = UserRole::find()
            .filter(user_role::Column::UserId.eq(*user_id))
            .order_by_asc(user_role::Column::Role)
            .all(&self.db)
            .await
            .map_err(DaoLayerError::Db)?;
        Ok(rows.into_iter().map(|row| row.role).collect())
    }

    /// Grants `role` to the user. Granting a role the user already has is a no-op.
    pub async fn assign(&self, user_id: &Uuid, role: &str) -> DaoResult<()> {
        self.assign_with(&self.db, user_id, role).await
    }

    pub async fn assign_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &Uuid,
        role: &str,
    ) -> DaoResult<()> {
        let existing = UserRole::find()
            .filter(user_role::Column::UserId.eq(*user_id))
            .filter(user_role::Column::Role.eq(role))
            .one(conn)
            .await
            .map_err(DaoLayerError::Db)?;
        if existing.is_some() {
            return Ok(());
        }

        let now = Utc::now().fixed_offset();
        let model = user_role::ActiveModel {
            id: Set(Uuid::new_v4()),
            created_at: Set(now),
            updated_at: Set(now),
            user_id: Set(*user_id),
            role: Set(role.to_string()),
            ..Default::default()
        };
        match model.insert(conn).await.map_err(DaoLayerError::Db) {
            Ok(_) => Ok(()),
            Err(err) if err.is_unique_violation() => Ok(()),
            Err(err) => Err(err),
        }
    }
}
