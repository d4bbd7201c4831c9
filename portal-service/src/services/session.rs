use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::CookieJar;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::sync::Arc;
use uuid::Uuid;

use super::Store;
use crate::policy::Principal;

pub const SESSION_COOKIE: &str = "portal_session";

/// Supplies the caller's principal for a request, or `None` when there is
/// no usable session.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<Principal>, AppError>;
}

/// Session token claims. Only the user id is carried; role, company and
/// active flag are read fresh on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

/// HS256 signer/verifier for session tokens.
#[derive(Clone)]
pub struct SessionTokens {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl SessionTokens {
    pub fn new(secret: &Secret<String>, ttl_hours: i64) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            AppError::InternalError(anyhow::anyhow!("Failed to encode session token: {}", e))
        })
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, AppError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}

/// Cookie first, then `Authorization: Bearer`.
fn session_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

/// Token-backed provider: verifies the session token, then loads the user.
#[derive(Clone)]
pub struct TokenSessionProvider {
    tokens: SessionTokens,
    store: Arc<dyn Store>,
}

impl TokenSessionProvider {
    pub fn new(tokens: SessionTokens, store: Arc<dyn Store>) -> Self {
        Self { tokens, store }
    }
}

#[async_trait]
impl SessionProvider for TokenSessionProvider {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<Principal>, AppError> {
        let Some(token) = session_token(headers) else {
            return Ok(None);
        };

        let claims = match self.tokens.verify(&token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid session token");
                return Ok(None);
            }
        };

        let Ok(user_id) = Uuid::parse_str(&claims.sub) else {
            tracing::debug!("Session token subject is not a user id");
            return Ok(None);
        };

        let user = self.store.get_user(user_id).await?;
        Ok(user.map(|u| u.principal()))
    }
}
