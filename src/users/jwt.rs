use std::time::Duration;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};

use crate::{config::JwtConfig, error::ApiError, state::AppState};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user email
    pub exp: usize,
    pub iat: usize,
    pub kind: TokenKind,
}

#[derive(Clone)]
struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Signs and validates access and refresh tokens. The two kinds use
/// distinct secrets, so one cannot be forged from the other.
#[derive(Clone)]
pub struct JwtKeys {
    access: KeyPair,
    refresh: KeyPair,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

/// A signed token together with its expiration instant.
#[derive(Debug, Clone)]
pub struct SignedToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

impl From<&JwtConfig> for JwtKeys {
    fn from(config: &JwtConfig) -> Self {
        Self {
            access: KeyPair::from_secret(&config.access_secret),
            refresh: KeyPair::from_secret(&config.refresh_secret),
            access_ttl: Duration::from_secs((config.access_ttl_minutes as u64) * 60),
            refresh_ttl: Duration::from_secs((config.refresh_ttl_minutes as u64) * 60),
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::from(&state.config.jwt)
    }
}

impl JwtKeys {
    fn keys_for(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    fn sign_with_kind(&self, subject: &str, kind: TokenKind) -> anyhow::Result<SignedToken> {
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let expires_at = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: expires_at.unix_timestamp() as usize,
            kind,
        };
        let token = encode(&Header::default(), &claims, &self.keys_for(kind).encoding)?;
        debug!(subject = %subject, kind = ?kind, "jwt signed");
        Ok(SignedToken { token, expires_at })
    }

    pub fn sign_access(&self, subject: &str) -> anyhow::Result<SignedToken> {
        self.sign_with_kind(subject, TokenKind::Access)
    }

    pub fn sign_refresh(&self, subject: &str) -> anyhow::Result<SignedToken> {
        self.sign_with_kind(subject, TokenKind::Refresh)
    }

    /// Verifies signature and expiry against the keys for `expected`, and
    /// rejects a token whose embedded kind does not match.
    pub fn verify(&self, token: &str, expected: TokenKind) -> anyhow::Result<Claims> {
        let validation = Validation::default();
        let data = decode::<Claims>(token, &self.keys_for(expected).decoding, &validation)?;
        if data.claims.kind != expected {
            anyhow::bail!("wrong token kind");
        }
        debug!(subject = %data.claims.sub, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }
}

/// Extracts the authenticated user's email from a bearer access token.
pub struct AuthUser(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::InvalidToken("Missing Authorization header".into()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::InvalidToken("Invalid Authorization header".into()))?;

        match keys.verify(token, TokenKind::Access) {
            Ok(claims) => Ok(AuthUser(claims.sub)),
            Err(_) => {
                warn!("invalid or expired access token");
                Err(ApiError::InvalidToken("Invalid or expired token".into()))
            }
        }
    }
}
