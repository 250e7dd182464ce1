use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    errors::ApiError,
    models::{ADMIN_ROLE, User, UserSummary},
};

const NO_TOKEN: &str = "Access denied. No token provided.";
const BAD_TOKEN: &str = "Invalid or expired token.";
const ADMINS_ONLY: &str = "Admins only.";

/// Claims
///
/// Payload of an admin session token, signed with HS256 and `JWT_SECRET`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
    /// Issued At (iat), seconds since the epoch.
    pub iat: usize,
    /// Expiration Time (exp). Tokens past this instant are rejected.
    pub exp: usize,
}

/// issue_token
///
/// Signs a token for `user` that stays valid for `ttl`.
pub fn issue_token(user: &User, secret: &str, ttl: Duration) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        user_id: user.id,
        email: user.email.clone(),
        role: user.role.clone(),
        iat: now.timestamp().max(0) as usize,
        exp: (now + ttl).timestamp().max(0) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Decodes and verifies a token, including its expiry.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
}

/// AuthUser
///
/// The identity carried by a valid bearer token. No database round trip: the signed claims
/// are trusted until they expire.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.user_id,
            email: claims.email,
            role: claims.role,
        }
    }
}

impl From<AuthUser> for UserSummary {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
        }
    }
}

/// AuthUser Extractor Implementation
///
/// Reads `Authorization: Bearer <token>`.
///
/// Rejection: 401 when no token is presented, 403 when the token is malformed, forged
/// or expired.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::Unauthorized(NO_TOKEN.to_string()))?;

        match decode_token(token, &config.jwt_secret) {
            Ok(claims) => Ok(claims.into()),
            Err(e) => {
                match e.kind() {
                    ErrorKind::ExpiredSignature => tracing::warn!("rejected expired token"),
                    other => tracing::warn!(reason = ?other, "rejected invalid token"),
                }
                Err(ApiError::Forbidden(BAD_TOKEN.to_string()))
            }
        }
    }
}

/// AdminUser
///
/// An `AuthUser` whose role is `admin`. Every mutating handler takes this extractor, so the
/// role check cannot be forgotten when a route is added.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ADMIN_ROLE {
            tracing::warn!(user_id = %user.id, role = %user.role, "non-admin blocked from admin route");
            return Err(ApiError::Forbidden(ADMINS_ONLY.to_string()));
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> User {
        User {
            id: Uuid::new_v4(),
            email: "admin@example.com".to_string(),
            password_hash: String::new(),
            role: ADMIN_ROLE.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_round_trips_claims() {
        let user = admin();
        let token = issue_token(&user, "secret", Duration::days(7)).expect("token");
        let claims = decode_token(&token, "secret").expect("claims");
        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.role, ADMIN_ROLE);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(&admin(), "secret", Duration::days(7)).expect("token");
        assert!(decode_token(&token, "other-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue_token(&admin(), "secret", Duration::hours(-2)).expect("token");
        let err = decode_token(&token, "secret").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ExpiredSignature));
    }

    #[test]
    fn claims_use_camel_case_user_id() {
        let token = issue_token(&admin(), "secret", Duration::days(1)).expect("token");
        let claims = decode_token(&token, "secret").expect("claims");
        let json = serde_json::to_value(&claims).expect("json");
        assert!(json.get("userId").is_some());
        assert!(json.get("user_id").is_none());
    }
}
