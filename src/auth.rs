use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::{config::AppConfig, error::ApiError, repository::RepositoryState};

/// Claims
///
/// Payload expected inside the admin bearer token. Tokens are issued elsewhere; this
/// service only verifies them against the shared secret.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the admin username.
    pub sub: String,
    /// Expiration Time (exp), seconds since the epoch.
    pub exp: usize,
    /// Issued At (iat), seconds since the epoch.
    pub iat: usize,
}

/// AuthUser
///
/// The resolved identity of an authenticated admin request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
}

/// AuthUser Extractor
///
/// Gate for every admin route:
/// 1. `Authorization: Bearer <token>` must be present (403 otherwise).
/// 2. The token must not be on the revocation list (401 `Token is blocked`).
/// 3. Signature and expiry must verify against the configured secret (401).
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::Forbidden("Token missing or malformed".to_string()))?;

        if repo.is_token_revoked(token).await? {
            tracing::warn!("Rejected revoked token");
            return Err(ApiError::Unauthorized("Token is blocked".to_string()));
        }

        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
            let message = match e.kind() {
                ErrorKind::ExpiredSignature => "Token expired",
                _ => "Invalid token",
            };
            tracing::debug!(error = ?e, "Bearer token rejected");
            ApiError::Unauthorized(message.to_string())
        })?;

        Ok(AuthUser {
            username: token_data.claims.sub,
        })
    }
}
