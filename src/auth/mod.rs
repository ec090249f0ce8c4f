use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;
use crate::tenancy::{CallerIdentity, TenantId};

/// Session token claims. The tenant claim is bound at login and is the only
/// tenant a session can act on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(caller: &CallerIdentity, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: caller.id.clone(),
            tenant_id: caller.claimed_tenant_id.as_ref().map(|t| t.as_str().to_string()),
            role: caller.role.clone(),
            exp,
            iat: now.timestamp(),
        }
    }
}

impl From<Claims> for CallerIdentity {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            claimed_tenant_id: claims
                .tenant_id
                .filter(|t| !t.is_empty())
                .map(TenantId::new),
            role: claims.role,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("Token generation failed: {0}")]
    TokenGeneration(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

pub fn issue_token(security: &SecurityConfig, caller: &CallerIdentity) -> Result<String, AuthError> {
    if security.jwt_secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let claims = Claims::new(caller, security.jwt_expiry_hours);
    let encoding_key = EncodingKey::from_secret(security.jwt_secret.as_bytes());

    encode(&Header::default(), &claims, &encoding_key)
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

pub fn verify_token(security: &SecurityConfig, token: &str) -> Result<CallerIdentity, AuthError> {
    if security.jwt_secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(security.jwt_secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims.into())
}

/// Extract the token from an `Authorization: Bearer <token>` value
pub fn extract_bearer_token(auth_header: &str) -> Result<&str, AuthError> {
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidToken("Authorization header must use Bearer token format".to_string()))?
        .trim();

    if token.is_empty() {
        return Err(AuthError::InvalidToken("Empty bearer token".to_string()));
    }
    Ok(token)
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(password, cost).map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Malformed stored hashes count as a mismatch rather than an error
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    bcrypt::verify(password, password_hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn caller(tenant: Option<&str>) -> CallerIdentity {
        CallerIdentity {
            id: "u1".to_string(),
            claimed_tenant_id: tenant.map(TenantId::new),
            role: "teacher".to_string(),
        }
    }

    #[test]
    fn token_round_trip_preserves_claimed_tenant() {
        let security = AppConfig::development().security;
        let token = issue_token(&security, &caller(Some("t-alnoor"))).unwrap();
        let identity = verify_token(&security, &token).unwrap();
        assert_eq!(identity, caller(Some("t-alnoor")));
    }

    #[test]
    fn token_without_tenant_claim_has_none() {
        let security = AppConfig::development().security;
        let token = issue_token(&security, &caller(None)).unwrap();
        assert_eq!(verify_token(&security, &token).unwrap().claimed_tenant_id, None);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let security = AppConfig::development().security;
        let mut other = security.clone();
        other.jwt_secret = "another-secret".to_string();

        let token = issue_token(&other, &caller(Some("t1"))).unwrap();
        assert!(matches!(verify_token(&security, &token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn missing_secret_refuses_to_sign() {
        let mut security = AppConfig::development().security;
        security.jwt_secret.clear();
        assert!(matches!(issue_token(&security, &caller(None)), Err(AuthError::MissingSecret)));
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer_token("Bearer abc.def").unwrap(), "abc.def");
        assert!(extract_bearer_token("Basic abc").is_err());
        assert!(extract_bearer_token("Bearer   ").is_err());
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("s3cret-pass", 4).unwrap();
        assert_ne!(hash, "s3cret-pass");
        assert!(verify_password("s3cret-pass", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("s3cret-pass", "not-a-hash"));
    }
}
