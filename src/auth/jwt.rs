use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::{RngCore, rngs::OsRng};
use uuid::Uuid;

use super::{AuthError, Claims, Role};
use crate::{config::AuthConfig, db::entities::user};

const REFRESH_TOKEN_BYTES: usize = 64;

#[derive(Clone)]
pub struct JwtKeys {
    pub enc: EncodingKey,
    pub dec: DecodingKey,
}

impl JwtKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            enc: EncodingKey::from_secret(secret),
            dec: DecodingKey::from_secret(secret),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub jwt_id: String,
}

/// Signs and verifies HS256 access tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    keys: JwtKeys,
    access_ttl: Duration,
    issuer: Option<String>,
    audience: Option<String>,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], access_ttl: Duration) -> Self {
        Self {
            keys: JwtKeys::from_secret(secret),
            access_ttl,
            issuer: None,
            audience: None,
        }
    }

    pub fn from_config(cfg: &AuthConfig) -> Self {
        Self::new(
            cfg.jwt_secret.as_bytes(),
            Duration::minutes(cfg.access_token_minutes),
        )
        .with_issuer(cfg.issuer.clone(), cfg.audience.clone())
    }

    pub fn with_issuer(mut self, issuer: Option<String>, audience: Option<String>) -> Self {
        self.issuer = issuer.filter(|value| !value.trim().is_empty());
        self.audience = audience.filter(|value| !value.trim().is_empty());
        self
    }

    pub fn issue_access_token(
        &self,
        user: &user::Model,
        roles: &[Role],
    ) -> Result<AccessToken, AuthError> {
        let issued_at = Utc::now();
        let expires_at = issued_at + self.access_ttl;
        let jwt_id = Uuid::new_v4().to_string();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            jti: jwt_id.clone(),
            roles: roles.to_vec(),
            iat: issued_at.timestamp() as usize,
            exp: expires_at.timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            nameid: None,
        };

        Ok(AccessToken {
            token: self.encode(&claims)?,
            expires_at,
            jwt_id,
        })
    }

    pub fn encode(&self, claims: &Claims) -> Result<String, AuthError> {
        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".into());

        encode(&header, claims, &self.keys.enc).map_err(AuthError::TokenEncoding)
    }

    /// Checks signature, expiry (no clock skew) and, when configured, issuer
    /// and audience.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        match &self.issuer {
            Some(issuer) => validation.set_issuer(&[issuer]),
            None => validation.iss = None,
        }
        match &self.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        decode::<Claims>(token, &self.keys.dec, &validation)
            .map(|data| data.claims)
            .map_err(|err| {
                tracing::debug!(error = %err, "rejected access token");
                AuthError::InvalidAccessToken
            })
    }
}

/// Opaque refresh token: 64 random bytes, standard base64.
pub fn issue_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}
