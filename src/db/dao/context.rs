use sea_orm::DatabaseConnection;

use super::{AuditLogDao, DaoBase, PasswordResetDao, RefreshTokenDao, UserDao, UserRoleDao};

#[derive(Clone)]
pub struct DaoContext {
    db: DatabaseConnection,
}

impl DaoContext {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn user(&self) -> UserDao {
        DaoBase::new(&self.db)
    }

    pub fn user_role(&self) -> UserRoleDao {
        DaoBase::new(&self.db)
    }

    pub fn refresh_token(&self) -> RefreshTokenDao {
        DaoBase::new(&self.db)
    }

    pub fn password_reset(&self) -> PasswordResetDao {
        DaoBase::new(&self.db)
    }

    pub fn audit_log(&self) -> AuditLogDao {
        DaoBase::new(&self.db)
    }
}
