use anyhow::{Result, bail};

use super::{AppConfig, EmailProviderId};

pub fn validate(cfg: &AppConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    if cfg.general.host.trim().is_empty() {
        errors.push("general.host must not be empty".to_string());
    }

    if url::Url::parse(&cfg.general.frontend_url).is_err() {
        errors.push(format!(
            "general.frontend_url ({}) must be an absolute URL",
            cfg.general.frontend_url
        ));
    }

    if cfg.database.url.trim().is_empty() {
        errors.push("database.url must not be empty".to_string());
    }

    if cfg.database.min_idle > cfg.database.max_connections {
        errors.push(format!(
            "database.min_idle ({}) must be <= database.max_connections ({})",
            cfg.database.min_idle, cfg.database.max_connections
        ));
    }

    if cfg.auth.jwt_secret.trim().is_empty() {
        errors.push("auth.jwt_secret must not be empty".to_string());
    }

    if cfg.auth.access_token_minutes <= 0 {
        errors.push("auth.access_token_minutes must be > 0".to_string());
    }

    if cfg.auth.refresh_token_days <= 0 {
        errors.push("auth.refresh_token_days must be > 0".to_string());
    }

    if cfg.auth.reset_token_minutes <= 0 {
        errors.push("auth.reset_token_minutes must be > 0".to_string());
    }

    match (
        cfg.auth.seed_admin_email.as_deref(),
        cfg.auth.seed_admin_password.as_deref(),
    ) {
        (Some(email), Some(password)) => {
            if email.trim().is_empty() {
                errors.push("auth.seed_admin_email must not be empty".to_string());
            }
            if password.is_empty() {
                errors.push("auth.seed_admin_password must not be empty".to_string());
            }
        }
        (None, None) => {}
        _ => errors.push(
            "auth.seed_admin_email and auth.seed_admin_password must be set together".to_string(),
        ),
    }

    if cfg.audit.retention_days < 0 {
        errors.push("audit.retention_days must be >= 0".to_string());
    }

    if cfg.email.max_attempts == 0 {
        errors.push("email.max_attempts must be > 0".to_string());
    }

    if cfg.email.queue_capacity == 0 {
        errors.push("email.queue_capacity must be > 0".to_string());
    }

    if cfg.email.provider == EmailProviderId::SendGrid {
        if cfg
            .email
            .api_key
            .as_deref()
            .is_none_or(|key| key.trim().is_empty())
        {
            errors.push("email.api_key is required for the sendgrid provider".to_string());
        }
        if url::Url::parse(&cfg.email.api_url).is_err() {
            errors.push("email.api_url must be an absolute URL".to_string());
        }
    }

    if errors.is_empty() {
        return Ok(());
    }

    bail!("invalid app config:\n- {}", errors.join("\n- "))
}

#[cfg(test)]
mod tests {
    use super::validate;
    use crate::config::{AppConfig, AuthConfig, DatabaseConfig, EmailConfig, EmailProviderId};

    fn valid_config() -> AppConfig {
        AppConfig {
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                ..Default::default()
            },
            auth: AuthConfig {
                jwt_secret: "secret".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn accepts_defaults_with_required_values() {
        validate(&valid_config()).expect("config should be valid");
    }

    #[test]
    fn collects_every_error() {
        let mut cfg = valid_config();
        cfg.auth.jwt_secret = " ".to_string();
        cfg.auth.refresh_token_days = 0;
        cfg.auth.seed_admin_email = Some("admin@example.com".to_string());

        let message = validate(&cfg).expect_err("config should be invalid").to_string();
        assert!(message.contains("auth.jwt_secret must not be empty"));
        assert!(message.contains("auth.refresh_token_days must be > 0"));
        assert!(message.contains("must be set together"));
    }

    #[test]
    fn sendgrid_requires_api_key() {
        let mut cfg = valid_config();
        cfg.email = EmailConfig {
            provider: EmailProviderId::SendGrid,
            ..Default::default()
        };

        let message = validate(&cfg).expect_err("config should be invalid").to_string();
        assert!(message.contains("email.api_key is required"));
    }
}
