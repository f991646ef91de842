use std::{marker::PhantomData, sync::Arc};

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::{
    auth::{AdminRole, Claims, RequiredRole},
    error::AppError,
    state::AppState,
};

/// Bearer token from the `Authorization` header, if it has one.
pub(crate) fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// Auth guard: validate JWT and return claims.
impl FromRequestParts<Arc<AppState>> for Claims {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<Claims>().cloned() {
            return Ok(claims);
        }

        let token = bearer_token(parts)
            .ok_or_else(|| AppError::unauthorized("Missing/invalid Authorization header"))?;
        let claims = state.tokens.verify(token)?;

        parts.extensions.insert(claims.clone());
        Ok(claims)
    }
}

pub type AuthGuard = Claims;

pub struct AuthRoleGuard<R: RequiredRole> {
    pub claims: Claims,
    _marker: PhantomData<R>,
}

impl<R> FromRequestParts<Arc<AppState>> for AuthRoleGuard<R>
where
    R: RequiredRole,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let claims = Claims::from_request_parts(parts, state).await?;

        if !claims.has_role(R::required()) {
            return Err(AppError::forbidden("Missing required role"));
        }

        Ok(Self {
            claims,
            _marker: PhantomData,
        })
    }
}

/// Gates the audit-log routes behind the Admin role when
/// `audit.require_admin` is set.
pub async fn require_audit_access(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.config.audit.require_admin {
        return Ok(next.run(req).await);
    }

    let (mut parts, body) = req.into_parts();
    AuthRoleGuard::<AdminRole>::from_request_parts(&mut parts, &state).await?;
    Ok(next.run(Request::from_parts(parts, body)).await)
}
