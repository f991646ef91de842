pub mod audit_logs;
pub mod auth;
mod entry;

pub use entry::{API_PREFIX, app, router};
