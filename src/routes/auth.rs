use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    auth::Claims,
    error::AppError,
    response::{ApiResult, MessageResponse},
    services::{ServiceContext, session_service::SessionTokens, user_service::UserProfile},
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body of `refresh` and `logout`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RefreshTokenRequest {
    pub token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires: DateTime<Utc>,
    pub refresh_token: String,
    pub user_data: UserProfile,
}

impl From<SessionTokens> for LoginResponse {
    fn from(tokens: SessionTokens) -> Self {
        Self {
            token: tokens.access.token,
            expires: tokens.access.expires_at,
            refresh_token: tokens.refresh_token,
            user_data: tokens.user,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub user: UserProfile,
    pub token: String,
    pub expires: DateTime<Utc>,
    pub refresh_token: String,
}

impl From<SessionTokens> for RefreshResponse {
    fn from(tokens: SessionTokens) -> Self {
        Self {
            user: tokens.user,
            token: tokens.access.token,
            expires: tokens.access.expires_at,
            refresh_token: tokens.refresh_token,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/logout-all", post(logout_all))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .with_state(state)
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<MessageResponse> {
    let session = ServiceContext::from_state(&state).session(&state);
    session
        .register(&body.email, &body.password, &body.full_name)
        .await?;
    MessageResponse::ok("User registered successfully")
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let session = ServiceContext::from_state(&state).session(&state);
    let tokens = session.login(&body.email, &body.password).await?;
    Ok(Json(tokens.into()))
}

async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RefreshTokenRequest>,
) -> ApiResult<RefreshResponse> {
    let session = ServiceContext::from_state(&state).session(&state);
    let tokens = session.refresh(&body.token).await?;
    Ok(Json(tokens.into()))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Json(body): Json<RefreshTokenRequest>,
) -> ApiResult<MessageResponse> {
    let caller = claims
        .user_id()
        .ok_or_else(|| AppError::unauthorized("Invalid token subject"))?;
    let session = ServiceContext::from_state(&state).session(&state);
    session.logout(&body.token, &caller).await?;
    MessageResponse::ok("Logged out from current session")
}

async fn logout_all(
    State(state): State<Arc<AppState>>,
    claims: Claims,
) -> ApiResult<MessageResponse> {
    let caller = claims
        .user_id()
        .ok_or_else(|| AppError::unauthorized("Invalid token subject"))?;
    let session = ServiceContext::from_state(&state).session(&state);
    let revoked = session.logout_all(&caller).await?;
    MessageResponse::ok(format!("Logged out from all sessions ({revoked} revoked)"))
}

async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ForgotPasswordRequest>,
) -> ApiResult<MessageResponse> {
    let session = ServiceContext::from_state(&state).session(&state);
    session.forgot_password(&body.email).await?;
    MessageResponse::ok("If the email exists, a reset link has been sent.")
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ResetPasswordRequest>,
) -> ApiResult<MessageResponse> {
    let session = ServiceContext::from_state(&state).session(&state);
    session
        .reset_password(&body.email, &body.token, &body.new_password)
        .await?;
    MessageResponse::ok("Password has been reset successfully.")
}
