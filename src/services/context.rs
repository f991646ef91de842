use sea_orm::DatabaseConnection;

use crate::{
    db::dao::{DaoContext, RefreshTokenDao},
    services::{
        audit_service::AuditService,
        session_service::{SessionService, SessionSettings},
        user_service::UserService,
    },
    state::AppState,
};

#[derive(Clone)]
pub struct ServiceContext {
    daos: DaoContext,
}

impl ServiceContext {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self {
            daos: DaoContext::new(db),
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(&state.db)
    }

    pub fn daos(&self) -> &DaoContext {
        &self.daos
    }

    pub fn user(&self) -> UserService {
        UserService::new(self.daos.user(), self.daos.user_role())
    }

    pub fn audit(&self) -> AuditService {
        AuditService::new(self.daos.audit_log())
    }

    pub fn refresh_token_dao(&self) -> RefreshTokenDao {
        self.daos.refresh_token()
    }

    pub fn session(&self, state: &AppState) -> SessionService {
        SessionService::new(
            state.credentials.clone(),
            self.user(),
            self.refresh_token_dao(),
            state.tokens.clone(),
            state.mailer.clone(),
            SessionSettings::from_config(&state.config),
        )
    }
}
