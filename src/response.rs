use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::AppError;

pub type ApiResult<T> = Result<Json<T>, AppError>;

/// Body used by every endpoint that answers with a single human-readable line.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn ok(message: impl Into<String>) -> ApiResult<Self> {
        Ok(Json(Self::new(message)))
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorsResponse {
    pub errors: Vec<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            log_app_error(&self, status);
        }

        match self {
            AppError::Validation(errors) => (status, Json(ErrorsResponse { errors })).into_response(),
            other => (status, Json(MessageResponse::new(other.message()))).into_response(),
        }
    }
}

pub(crate) fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
        AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn log_app_error(err: &AppError, status: StatusCode) {
    tracing::error!(status = status.as_u16(), error = %err, "request failed");
}

#[cfg(test)]
mod tests {
    use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};
    use serde_json::{Value, json};

    use crate::error::AppError;

    async fn render(err: AppError) -> (StatusCode, Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX)
            .await
            .expect("body should read");
        let body = serde_json::from_slice(&bytes).expect("body should be json");
        (status, body)
    }

    #[tokio::test]
    async fn message_errors_render_message_body() {
        let (status, body) = render(AppError::unauthorized("Invalid email or password")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "message": "Invalid email or password" }));
    }

    #[tokio::test]
    async fn validation_errors_render_errors_list() {
        let (status, body) = render(AppError::validation(vec![
            "Email 'a@b.c' is already taken.".to_string(),
        ]))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "errors": ["Email 'a@b.c' is already taken."] }));
    }
}
