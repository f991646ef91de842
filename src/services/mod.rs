pub mod audit_service;
pub mod context;
pub mod session_service;
pub mod user_service;

pub use context::ServiceContext;
