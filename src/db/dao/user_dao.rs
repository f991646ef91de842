use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set,
};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::{prelude::User, user};

#[derive(Clone)]
pub struct UserDao {
    db: DatabaseConnection,
}

impl DaoBase for UserDao {
    type Entity = User;

    fn from_db(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl UserDao {
    /// `email` must already be normalized.
    pub async fn find_by_email(&self, email: &str) -> DaoResult<Option<user::Model>> {
        self.find_by_email_with(&self.db, email).await
    }

    pub async fn find_by_email_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        email: &str,
    ) -> DaoResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email))
            .one(conn)
            .await
            .map_err(DaoLayerError::Db)
    }

    /// Inserts on an arbitrary connection so the write can join a transaction.
    pub async fn create_user_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        email: &str,
        password_hash: &str,
        full_name: &str,
    ) -> DaoResult<user::Model> {
        let now = Utc::now().fixed_offset();
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            created_at: Set(now),
            updated_at: Set(now),
            email: Set(email.to_string()),
            password_hash: Set(password_hash.to_string()),
            full_name: Set(full_name.to_string()),
            last_login_at: Set(None),
            ..Default::default()
        };
        model.insert(conn).await.map_err(DaoLayerError::Db)
    }

    pub async fn set_last_login(
        &self,
        id: &Uuid,
        at: &chrono::DateTime<chrono::FixedOffset>,
    ) -> DaoResult<()> {
        let at = *at;
        self.update(*id, move |active| {
            active.last_login_at = Set(Some(at));
        })
        .await
        .map(|_| ())
    }

    pub async fn set_password_hash(&self, id: &Uuid, password_hash: &str) -> DaoResult<()> {
        let password_hash = password_hash.to_string();
        self.update(*id, move |active| {
            active.password_hash = Set(password_hash);
        })
        .await
        .map(|_| ())
    }
}
