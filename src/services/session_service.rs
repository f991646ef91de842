use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::TransactionTrait;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        AccessToken, AuthError, CredentialStore, NewUserProfile, Role, TokenIssuer,
        jwt::issue_refresh_token,
    },
    config::AppConfig,
    db::dao::{DaoBase, DaoLayerError, RefreshTokenDao},
    db::entities::user,
    mail::{EmailQueue, PasswordResetEmail, reset_link},
    services::user_service::{UserProfile, UserService},
};

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub refresh_ttl: Duration,
    pub reset_ttl_minutes: i64,
    pub frontend_url: String,
    pub product_name: String,
}

impl SessionSettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            refresh_ttl: Duration::days(cfg.auth.refresh_token_days),
            reset_ttl_minutes: cfg.auth.reset_token_minutes,
            frontend_url: cfg.general.frontend_url.clone(),
            product_name: cfg.email.from_name.clone(),
        }
    }
}

/// Access token plus the refresh token persisted alongside it.
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub access: AccessToken,
    pub refresh_token: String,
    pub user: UserProfile,
}

/// Register, login, token rotation, logout and password reset.
#[derive(Clone)]
pub struct SessionService {
    credentials: Arc<dyn CredentialStore>,
    users: UserService,
    refresh_tokens: RefreshTokenDao,
    tokens: TokenIssuer,
    mailer: EmailQueue,
    settings: SessionSettings,
}

impl SessionService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        users: UserService,
        refresh_tokens: RefreshTokenDao,
        tokens: TokenIssuer,
        mailer: EmailQueue,
        settings: SessionSettings,
    ) -> Self {
        Self {
            credentials,
            users,
            refresh_tokens,
            tokens,
            mailer,
            settings,
        }
    }

    /// Creates the account and its `Employee` role in one transaction.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<Uuid, AuthError> {
        let profile = NewUserProfile {
            full_name: full_name.to_string(),
        };

        let txn = self
            .refresh_tokens
            .db()
            .begin()
            .await
            .map_err(DaoLayerError::from)?;
        let user_id = self
            .credentials
            .create(&txn, email, password, &profile)
            .await?;
        self.users
            .assign_role_with(&txn, &user_id, Role::Employee)
            .await?;
        txn.commit().await.map_err(DaoLayerError::from)?;

        info!(%user_id, "user registered");
        Ok(user_id)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<SessionTokens, AuthError> {
        let user_id = self.credentials.verify(email, password).await?;
        let user = self
            .users
            .find_by_id(&user_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let now = Utc::now().fixed_offset();
        self.users.set_last_login(&user.id, &now).await?;

        let (access, roles) = self.issue_access(&user).await?;
        let refresh_token = issue_refresh_token();
        self.refresh_tokens
            .create_refresh_token(
                &user.id,
                &refresh_token,
                &access.jwt_id,
                now + self.settings.refresh_ttl,
            )
            .await?;

        info!(user_id = %user.id, "user logged in");
        Ok(SessionTokens {
            access,
            refresh_token,
            user: UserService::profile(&user, roles),
        })
    }

    /// Rotates `token`: it is revoked and a new pair issued. Of several
    /// concurrent calls with the same token at most one succeeds.
    pub async fn refresh(&self, token: &str) -> Result<SessionTokens, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingRefreshToken);
        }

        let now = Utc::now().fixed_offset();
        let current = self
            .refresh_tokens
            .find_by_token(token)
            .await?
            .filter(|stored| stored.is_active(now))
            .ok_or(AuthError::InvalidRefreshToken)?;
        let user = self
            .users
            .find_by_id(&current.user_id)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        let (access, roles) = self.issue_access(&user).await?;
        let refresh_token = issue_refresh_token();

        let txn = self
            .refresh_tokens
            .db()
            .begin()
            .await
            .map_err(DaoLayerError::from)?;
        if !self.refresh_tokens.revoke_if_active(&txn, token, now).await? {
            warn!(user_id = %user.id, "refresh token consumed concurrently");
            return Err(AuthError::InvalidRefreshToken);
        }
        self.refresh_tokens
            .insert_with(
                &txn,
                &user.id,
                &refresh_token,
                &access.jwt_id,
                now + self.settings.refresh_ttl,
            )
            .await?;
        txn.commit().await.map_err(DaoLayerError::from)?;

        info!(user_id = %user.id, "refresh token rotated");
        Ok(SessionTokens {
            access,
            refresh_token,
            user: UserService::profile(&user, roles),
        })
    }

    /// Revokes one of the caller's own refresh tokens.
    pub async fn logout(&self, token: &str, caller: &Uuid) -> Result<(), AuthError> {
        let stored = self
            .refresh_tokens
            .find_for_user(token.trim(), caller)
            .await?
            .ok_or(AuthError::RefreshTokenNotFound)?;
        if stored.revoked || !self.refresh_tokens.revoke(&stored.id).await? {
            return Err(AuthError::RefreshTokenAlreadyRevoked);
        }

        info!(user_id = %caller, "user logged out");
        Ok(())
    }

    pub async fn logout_all(&self, caller: &Uuid) -> Result<u64, AuthError> {
        let revoked = self.refresh_tokens.revoke_all_for_user(caller).await?;
        info!(user_id = %caller, revoked, "user logged out everywhere");
        Ok(revoked)
    }

    /// Queues a reset email when the account exists. Unknown emails succeed
    /// silently.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            info!("password reset requested for unknown email");
            return Ok(());
        };

        let code = self.credentials.generate_reset_token(&user.id).await?;
        let link = match reset_link(&self.settings.frontend_url, &code, &user.email) {
            Ok(link) => link,
            Err(err) => {
                warn!(error = %err, "could not build password reset link");
                return Ok(());
            }
        };
        let message = PasswordResetEmail {
            recipient_name: recipient_name(&user),
            product_name: &self.settings.product_name,
            reset_link: &link,
            valid_minutes: self.settings.reset_ttl_minutes,
        }
        .into_message(&user.email);

        match message.and_then(|message| self.mailer.enqueue(message)) {
            Ok(()) => info!(user_id = %user.id, "password reset email queued"),
            Err(err) => warn!(user_id = %user.id, error = %err, "password reset email not queued"),
        }
        Ok(())
    }

    pub async fn reset_password(
        &self,
        email: &str,
        token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if email.trim().is_empty() || token.trim().is_empty() {
            return Err(AuthError::InvalidResetRequest);
        }

        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::UnknownUser)?;
        self.credentials
            .reset_password(&user.id, token, new_password)
            .await?;

        let revoked = self.refresh_tokens.revoke_all_for_user(&user.id).await?;
        info!(user_id = %user.id, revoked, "password reset");
        Ok(())
    }

    async fn issue_access(&self, user: &user::Model) -> Result<(AccessToken, Vec<Role>), AuthError> {
        let roles = self.users.roles_for(&user.id).await?;
        let access = self.tokens.issue_access_token(user, &roles)?;
        Ok((access, roles))
    }
}

fn recipient_name(user: &user::Model) -> &str {
    if user.full_name.trim().is_empty() {
        &user.email
    } else {
        &user.full_name
    }
}
