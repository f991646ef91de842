use thiserror::Error;

use crate::{db::dao::DaoLayerError, error::AppError};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Invalid or expired refresh token")]
    InvalidRefreshToken,
    #[error("Refresh token is required")]
    MissingRefreshToken,
    #[error("Refresh token not found")]
    RefreshTokenNotFound,
    #[error("Refresh token already revoked")]
    RefreshTokenAlreadyRevoked,
    #[error("Invalid or expired token")]
    InvalidAccessToken,
    #[error("Invalid reset request.")]
    InvalidResetRequest,
    #[error("Invalid user.")]
    UnknownUser,
    #[error("{}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("token encoding failed: {0}")]
    TokenEncoding(#[source] jsonwebtoken::errors::Error),
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
    #[error(transparent)]
    Dao(#[from] DaoLayerError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::InvalidRefreshToken
            | AuthError::InvalidAccessToken => AppError::unauthorized(err.to_string()),
            AuthError::MissingRefreshToken
            | AuthError::RefreshTokenAlreadyRevoked
            | AuthError::InvalidResetRequest
            | AuthError::UnknownUser => AppError::bad_request(err.to_string()),
            AuthError::RefreshTokenNotFound => AppError::not_found(err.to_string()),
            AuthError::Validation(errors) => AppError::validation(errors),
            AuthError::TokenEncoding(_) | AuthError::PasswordHash(_) => {
                AppError::internal_with_source("authentication failed", err)
            }
            AuthError::Dao(err) => AppError::from(err),
        }
    }
}
