use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{defaults, envconfig::EnvConfig, validate};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub audit: AuditConfig,
    pub email: EmailConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        <Self as EnvConfig>::from_env()
    }
}

impl EnvConfig for AppConfig {
    fn validate(&self) -> Result<()> {
        validate::validate(self)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneralConfig {
    pub host: String,
    pub port: u16,
    /// Base URL of the web client; password reset links point at `{frontend_url}/reset-password`.
    pub frontend_url: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            host: defaults::DEFAULT_HOST.to_string(),
            port: defaults::DEFAULT_PORT as u16,
            frontend_url: defaults::DEFAULT_FRONTEND_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub rust_log: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            rust_log: defaults::DEFAULT_RUST_LOG.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_idle: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: defaults::DEFAULT_DB_MAX_CONNECTIONS as u32,
            min_idle: defaults::DEFAULT_DB_MIN_IDLE as u32,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
    pub reset_token_minutes: i64,
    pub seed_admin_email: Option<String>,
    pub seed_admin_password: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            issuer: None,
            audience: None,
            access_token_minutes: defaults::DEFAULT_ACCESS_TOKEN_MINUTES,
            refresh_token_days: defaults::DEFAULT_REFRESH_TOKEN_DAYS,
            reset_token_minutes: defaults::DEFAULT_RESET_TOKEN_MINUTES,
            seed_admin_email: None,
            seed_admin_password: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    pub enabled: bool,
    /// Restrict the audit-log endpoints to callers holding the Admin role.
    pub require_admin: bool,
    pub retention_days: i64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::DEFAULT_AUDIT_ENABLED,
            require_admin: defaults::DEFAULT_AUDIT_REQUIRE_ADMIN,
            retention_days: defaults::DEFAULT_AUDIT_RETENTION_DAYS,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmailProviderId {
    /// Writes outgoing mail to the log instead of delivering it.
    #[default]
    Log,
    SendGrid,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmailConfig {
    pub provider: EmailProviderId,
    pub from_email: String,
    pub from_name: String,
    pub api_key: Option<String>,
    pub api_url: String,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub queue_capacity: usize,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            provider: EmailProviderId::default(),
            from_email: defaults::DEFAULT_EMAIL_FROM.to_string(),
            from_name: defaults::DEFAULT_EMAIL_FROM_NAME.to_string(),
            api_key: None,
            api_url: defaults::DEFAULT_SENDGRID_API_URL.to_string(),
            max_attempts: defaults::DEFAULT_EMAIL_MAX_ATTEMPTS as u32,
            retry_delay_ms: defaults::DEFAULT_EMAIL_RETRY_DELAY_MS as u64,
            queue_capacity: defaults::DEFAULT_EMAIL_QUEUE_CAPACITY as usize,
        }
    }
}
