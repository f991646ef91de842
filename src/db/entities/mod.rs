#[allow(unused_imports)]
pub mod prelude {
    pub use super::audit_log::Entity as AuditLog;
    pub use super::password_reset_token::Entity as PasswordResetToken;
    pub use super::refresh_token::Entity as RefreshToken;
    pub use super::user::Entity as User;
    pub use super::user_role::Entity as UserRole;
}

pub mod audit_log;
pub mod password_reset_token;
pub mod refresh_token;
pub mod user;
pub mod user_role;
