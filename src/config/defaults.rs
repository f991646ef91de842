pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: i64 = 3000;
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
pub const DEFAULT_RUST_LOG: &str = "info,tower_http=info";
pub const DEFAULT_DB_MAX_CONNECTIONS: i64 = 10;
pub const DEFAULT_DB_MIN_IDLE: i64 = 2;

pub const DEFAULT_ACCESS_TOKEN_MINUTES: i64 = 60;
pub const DEFAULT_REFRESH_TOKEN_DAYS: i64 = 7;
pub const DEFAULT_RESET_TOKEN_MINUTES: i64 = 60;

pub const DEFAULT_AUDIT_ENABLED: bool = true;
pub const DEFAULT_AUDIT_REQUIRE_ADMIN: bool = false;
pub const DEFAULT_AUDIT_RETENTION_DAYS: i64 = 90;

pub const DEFAULT_EMAIL_FROM: &str = "no-reply@localhost";
pub const DEFAULT_EMAIL_FROM_NAME: &str = "Resource Booking";
pub const DEFAULT_SENDGRID_API_URL: &str = "https://api.sendgrid.com/v3/mail/send";
pub const DEFAULT_EMAIL_MAX_ATTEMPTS: i64 = 3;
pub const DEFAULT_EMAIL_RETRY_DELAY_MS: i64 = 500;
pub const DEFAULT_EMAIL_QUEUE_CAPACITY: i64 = 64;
