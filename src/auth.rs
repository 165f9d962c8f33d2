use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, JwtConfig},
    error::ApiError,
    models::TokenPair,
    repository::RepositoryState,
};

pub const EXPIRED_TOKEN: &str = "unauthorized, check expiration time of your token";
const MISSING_TOKEN: &str = "missing or malformed Authorization header";
const INVALID_TOKEN: &str = "invalid token";
const UNKNOWN_USER: &str = "user of this token no longer exists";

/// Claims
///
/// Payload carried by both access and refresh tokens. The two kinds differ only by
/// the secret that signs them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (sub): the user id.
    pub sub: Uuid,
    /// Expiration Time (exp), seconds since the epoch.
    pub exp: i64,
    /// Issued At (iat), seconds since the epoch.
    pub iat: i64,
    /// Unique token id, so two tokens issued in the same second still differ.
    pub jti: Uuid,
}

/// AuthUser Extractor Result
///
/// The resolved identity of an authenticated request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    /// Role of the user, recorded on every write.
    pub role: String,
}

/// AuthUser Extractor Implementation
///
/// 1. Reuses an identity already resolved by `auth_middleware` for this request.
/// 2. Extracts the `Bearer` token from the Authorization header.
/// 3. Verifies signature and expiry against the access secret (no leeway).
/// 4. Loads the user, rejecting tokens whose owner was deleted since issuance.
///
/// Any failure is a 401; only a database fault becomes a 500.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::Unauthorized(MISSING_TOKEN.to_string()))?;

        let claims = decode_access_token(token, &config.jwt).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => ApiError::Unauthorized(EXPIRED_TOKEN.to_string()),
            _ => {
                tracing::debug!(error = ?e, "rejected access token");
                ApiError::Unauthorized(INVALID_TOKEN.to_string())
            }
        })?;

        let user = repo
            .get_user(claims.sub)
            .await?
            .filter(|user| !user.is_deleted)
            .ok_or_else(|| ApiError::Unauthorized(UNKNOWN_USER.to_string()))?;

        Ok(AuthUser {
            id: user.id,
            role: user.role_id,
        })
    }
}

/// generate_tokens
///
/// Issues a new access/refresh pair for `user_id` using the configured lifetimes.
pub fn generate_tokens(
    user_id: Uuid,
    jwt: &JwtConfig,
) -> Result<TokenPair, jsonwebtoken::errors::Error> {
    let access_token = sign(
        user_id,
        Duration::minutes(jwt.access_ttl_minutes),
        &jwt.access_secret,
    )?;
    let refresh = sign(
        user_id,
        Duration::hours(jwt.refresh_ttl_hours),
        &jwt.refresh_secret,
    )?;

    Ok(TokenPair {
        access_token,
        refresh,
    })
}

fn sign(user_id: Uuid, ttl: Duration, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
        jti: Uuid::new_v4(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verifies an access token, expiry included.
pub fn decode_access_token(
    token: &str,
    jwt: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt.access_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
}

/// Verifies a refresh token's signature only. The renew flow compares `exp` itself so
/// an expired session and a forged token can be answered differently.
pub fn decode_refresh_token(
    token: &str,
    jwt: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt.refresh_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// False for a wrong password and for a hash that cannot be parsed.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is not a valid PHC string");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt() -> JwtConfig {
        AppConfig::default().jwt
    }

    #[test]
    fn access_token_round_trips() {
        let user_id = Uuid::new_v4();
        let pair = generate_tokens(user_id, &jwt()).unwrap();

        let claims = decode_access_token(&pair.access_token, &jwt()).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn token_kinds_are_not_interchangeable() {
        let pair = generate_tokens(Uuid::new_v4(), &jwt()).unwrap();

        assert!(decode_access_token(&pair.refresh, &jwt()).is_err());
        assert!(decode_refresh_token(&pair.access_token, &jwt()).is_err());
        assert!(decode_refresh_token(&pair.refresh, &jwt()).is_ok());
    }

    #[test]
    fn expired_access_token_is_rejected() {
        let config = jwt();
        let token = sign(Uuid::new_v4(), Duration::seconds(-5), &config.access_secret).unwrap();

        let err = decode_access_token(&token, &config).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ExpiredSignature));
    }

    #[test]
    fn expired_refresh_token_still_decodes() {
        let config = jwt();
        let token = sign(Uuid::new_v4(), Duration::hours(-1), &config.refresh_secret).unwrap();

        let claims = decode_refresh_token(&token, &config).unwrap();
        assert!(claims.exp < Utc::now().timestamp());
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("battery staple", &hash));
        assert!(!verify_password("correct horse", "not-a-hash"));
    }
}
