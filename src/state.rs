use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    auth::{CredentialStore, TokenIssuer},
    config::AppConfig,
    mail::EmailQueue,
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DatabaseConnection,
    pub tokens: TokenIssuer,
    pub credentials: Arc<dyn CredentialStore>,
    pub mailer: EmailQueue,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db: DatabaseConnection,
        credentials: Arc<dyn CredentialStore>,
        mailer: EmailQueue,
    ) -> Arc<Self> {
        Arc::new(Self {
            tokens: TokenIssuer::from_config(&config.auth),
            config,
            db,
            credentials,
            mailer,
        })
    }
}
