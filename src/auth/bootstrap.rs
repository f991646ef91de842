use std::sync::Arc;

use chrono::Duration;
use sea_orm::TransactionTrait;

use crate::{config::AuthConfig, services::ServiceContext};

use super::{CredentialStore, LocalCredentialStore, NewUserProfile, Role};

const SEED_ADMIN_NAME: &str = "Administrator";

pub fn build_credentials(cfg: &AuthConfig, services: &ServiceContext) -> Arc<dyn CredentialStore> {
    Arc::new(LocalCredentialStore::new(
        services.daos().user(),
        services.daos().password_reset(),
        Duration::minutes(cfg.reset_token_minutes),
    ))
}

/// Creates the configured admin account once. Existing accounts get the Admin
/// role added but keep their password.
pub async fn seed_admin(
    cfg: &AuthConfig,
    services: &ServiceContext,
    credentials: &dyn CredentialStore,
) -> anyhow::Result<()> {
    let (Some(email), Some(password)) = (
        cfg.seed_admin_email.as_deref(),
        cfg.seed_admin_password.as_deref(),
    ) else {
        return Ok(());
    };

    let users = services.user();
    if let Some(existing) = users.find_by_email(email).await? {
        tracing::info!("admin user already present: {}", existing.email);
        for role in [Role::Admin, Role::Employee] {
            users.assign_role(&existing.id, role).await?;
        }
        return Ok(());
    }

    let profile = NewUserProfile {
        full_name: SEED_ADMIN_NAME.to_string(),
    };
    let txn = services.daos().db().begin().await?;
    let user_id = credentials
        .create(&txn, email, password, &profile)
        .await
        .map_err(|err| anyhow::anyhow!("admin seed failed: {err}"))?;
    for role in [Role::Admin, Role::Employee] {
        users.assign_role_with(&txn, &user_id, role).await?;
    }
    txn.commit().await?;
    tracing::info!("seeded admin user {email}");
    Ok(())
}
