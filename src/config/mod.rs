pub mod configs;
pub mod defaults;
pub mod envconfig;
pub mod validate;

pub use configs::{
    AppConfig, AuditConfig, AuthConfig, DatabaseConfig, EmailConfig, EmailProviderId,
    GeneralConfig, LoggingConfig,
};
pub use envconfig::EnvConfig;
