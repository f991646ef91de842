use std::sync::Arc;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};

use crate::{
    middleware::{audit_middleware, catch_panic_layer, json_error_middleware},
    state::AppState,
};

use super::{audit_logs, auth};

pub const API_PREFIX: &str = "/api";

const HEALTH_TEXT: &str = "Resource Booking API is running";

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { HEALTH_TEXT }))
        .nest(
            API_PREFIX,
            Router::new()
                .nest("/auth", auth::router(state.clone()))
                .nest("/auditlogs", audit_logs::router(state)),
        )
}

/// Full application: routes plus error normalization, panic capture and, when
/// enabled, the audit interceptor as the outermost layer.
pub fn app(state: Arc<AppState>) -> Router {
    let app = router(state.clone())
        .layer(from_fn(json_error_middleware))
        .layer(catch_panic_layer());

    if state.config.audit.enabled {
        app.layer(from_fn_with_state(state, audit_middleware))
    } else {
        app
    }
}
