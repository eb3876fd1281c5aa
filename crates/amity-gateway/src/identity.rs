//! Bearer-token identity.
//!
//! The identity provider issues HS256 JWTs whose `user_id` claim names the
//! caller. The gateway only verifies them; [`TokenVerifier::issue_token`]
//! exists for tests and local development.

use crate::handlers::{AppError, AppState};
use amity_domain::UserId;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Identity verification error
#[derive(Debug, Error)]
pub enum IdentityError {
    /// JWT encoding failed
    #[error("Failed to encode JWT: {0}")]
    JwtEncode(#[from] jsonwebtoken::errors::Error),

    /// Token expired
    #[error("Bearer token expired")]
    TokenExpired,

    /// Invalid token
    #[error("Invalid bearer token")]
    InvalidToken,

    /// No usable Authorization header
    #[error("Missing bearer token")]
    MissingToken,
}

/// JWT claims carried by bearer tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// User identifier assigned by the identity provider
    pub user_id: String,

    /// Token expiration timestamp (Unix epoch)
    pub exp: u64,

    /// Issued at timestamp (Unix epoch)
    pub iat: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Verifies bearer tokens against the shared secret
pub struct TokenVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry_secs: u64,
}

impl TokenVerifier {
    /// Create a verifier with the given JWT secret and expiry for issued tokens
    pub fn new(jwt_secret: &str, token_expiry_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            token_expiry_secs,
        }
    }

    /// Issue a token for the given user
    pub fn issue_token(&self, user_id: &UserId) -> Result<String, IdentityError> {
        let now = now_secs();
        let claims = IdentityClaims {
            user_id: user_id.as_str().to_string(),
            exp: now + self.token_expiry_secs,
            iat: now,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Validate a token and extract claims
    pub fn validate_token(&self, token: &str) -> Result<IdentityClaims, IdentityError> {
        let validation = Validation::default();
        let token_data = decode::<IdentityClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => IdentityError::TokenExpired,
                _ => IdentityError::InvalidToken,
            })?;

        Ok(token_data.claims)
    }

    /// Resolve the acting user from an `Authorization` header value
    pub fn authenticate(&self, header: Option<&str>) -> Result<UserId, IdentityError> {
        let token = header
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(IdentityError::MissingToken)?;

        let claims = self.validate_token(token)?;
        Ok(UserId::new(claims.user_id))
    }
}

/// The authenticated caller of a request
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserId);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let user = state.verifier.authenticate(header)?;
        Ok(AuthUser(user))
    }
}
