pub mod audit_log_dao;
pub mod base;
pub mod base_traits;
mod context;
pub mod error;
pub mod password_reset_dao;
pub mod refresh_token_dao;
pub mod user_dao;
pub mod user_role_dao;

pub use audit_log_dao::{AuditLogDao, AuditLogFilter};
pub use base::{ColumnFilter, CompareOp, DaoBase, FilterOp, PaginatedResponse};
pub use base_traits::{HasCreatedAtColumn, HasIdActiveModel, TimestampedActiveModel};
pub use context::DaoContext;
pub use error::{DaoLayerError, DaoResult};
pub use password_reset_dao::PasswordResetDao;
pub use refresh_token_dao::RefreshTokenDao;
pub use user_dao::UserDao;
pub use user_role_dao::UserRoleDao;
