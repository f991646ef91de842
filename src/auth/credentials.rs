use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use rand::{RngCore, rngs::OsRng};
use sea_orm::DatabaseTransaction;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::{
    AuthError,
    password::{hash_password, verify_against_dummy, verify_password},
};
use crate::db::dao::{PasswordResetDao, UserDao};

const RESET_CODE_BYTES: usize = 32;

#[derive(Debug, Clone, Default)]
pub struct NewUserProfile {
    pub full_name: String,
}

/// Password credential storage, kept behind a trait so the session layer does
/// not care where users and hashes live.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns the user id when `password` matches the account for `email`.
    async fn verify(&self, email: &str, password: &str) -> Result<Uuid, AuthError>;

    /// Creates an account inside `txn`. Every validation failure is reported
    /// at once.
    async fn create(
        &self,
        txn: &DatabaseTransaction,
        email: &str,
        password: &str,
        profile: &NewUserProfile,
    ) -> Result<Uuid, AuthError>;

    /// Issues a single-use reset code for the user.
    async fn generate_reset_token(&self, user_id: &Uuid) -> Result<String, AuthError>;

    async fn reset_password(
        &self,
        user_id: &Uuid,
        reset_token: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

fn password_errors(password: &str) -> Option<String> {
    password
        .is_empty()
        .then(|| "Passwords must not be empty.".to_string())
}

fn digest_reset_code(code: &str) -> String {
    format!("{:x}", Sha256::digest(code.as_bytes()))
}

#[derive(Clone)]
pub struct LocalCredentialStore {
    users: UserDao,
    resets: PasswordResetDao,
    reset_ttl: Duration,
}

impl LocalCredentialStore {
    pub fn new(users: UserDao, resets: PasswordResetDao, reset_ttl: Duration) -> Self {
        Self {
            users,
            resets,
            reset_ttl,
        }
    }
}

#[async_trait]
impl CredentialStore for LocalCredentialStore {
    async fn verify(&self, email: &str, password: &str) -> Result<Uuid, AuthError> {
        let email = normalize_email(email);
        let Some(user) = self.users.find_by_email(&email).await? else {
            verify_against_dummy(password);
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(user.id)
    }

    async fn create(
        &self,
        txn: &DatabaseTransaction,
        email: &str,
        password: &str,
        profile: &NewUserProfile,
    ) -> Result<Uuid, AuthError> {
        let email = normalize_email(email);
        let mut errors = Vec::new();

        let email_ok = if email.is_empty() {
            errors.push("Email is required.".to_string());
            false
        } else if !is_valid_email(&email) {
            errors.push(format!("Email '{email}' is invalid."));
            false
        } else {
            true
        };
        errors.extend(password_errors(password));

        if email_ok && self.users.find_by_email_with(txn, &email).await?.is_some() {
            errors.push(format!("Email '{email}' is already taken."));
        }
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }

        let password_hash = hash_password(password)?;
        match self
            .users
            .create_user_with(txn, &email, &password_hash, profile.full_name.trim())
            .await
        {
            Ok(user) => Ok(user.id),
            Err(err) if err.is_unique_violation() => Err(AuthError::Validation(vec![format!(
                "Email '{email}' is already taken."
            )])),
            Err(err) => Err(err.into()),
        }
    }

    async fn generate_reset_token(&self, user_id: &Uuid) -> Result<String, AuthError> {
        let mut bytes = [0u8; RESET_CODE_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let code = URL_SAFE_NO_PAD.encode(bytes);

        let expires_at = Utc::now().fixed_offset() + self.reset_ttl;
        self.resets
            .create_reset(user_id, &digest_reset_code(&code), expires_at)
            .await?;
        Ok(code)
    }

    async fn reset_password(
        &self,
        user_id: &Uuid,
        reset_token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if let Some(error) = password_errors(new_password) {
            return Err(AuthError::Validation(vec![error]));
        }

        let now = Utc::now().fixed_offset();
        let consumed = self
            .resets
            .consume(user_id, &digest_reset_code(reset_token.trim()), now)
            .await?;
        if !consumed {
            return Err(AuthError::Validation(vec!["Invalid token.".to_string()]));
        }

        let password_hash = hash_password(new_password)?;
        self.users.set_password_hash(user_id, &password_hash).await?;
        Ok(())
    }
}
