mod audit;
mod guards;
mod json_error;
mod panic;

pub use audit::{BODY_CAPTURE_LIMIT, REDACTED, audit_middleware, sanitize_request_body};
pub use guards::{AuthGuard, AuthRoleGuard, require_audit_access};
pub use json_error::json_error_middleware;
pub use panic::catch_panic_layer;
