//! Bearer-token authentication
//!
//! Access and refresh tokens are HS256 JWTs carrying the user id, username,
//! role and token kind. Logout revokes a refresh token by storing the SHA-256
//! digest of its `jti`.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, error, warn};

use fintrack_core::config::{AuthSection, MAX_ACCESS_TTL_MINUTES, MAX_REFRESH_TTL_DAYS};
use fintrack_core::models::{Role, User};

use crate::{AppError, AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub username: String,
    pub role: Role,
    pub kind: TokenKind,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.sub
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid token"))
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Signs and validates tokens
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl AuthManager {
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            access_ttl,
            refresh_ttl,
        }
    }

    /// Build from the `[auth]` config section
    ///
    /// Without a configured secret a random one is generated, so tokens do not
    /// survive a restart.
    pub fn from_config(config: &AuthSection) -> Self {
        let secret = match config.jwt_secret.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.as_bytes().to_vec(),
            _ => {
                warn!("No JWT secret configured (set FINTRACK_JWT_SECRET); using an ephemeral secret");
                rand::thread_rng().gen::<[u8; 32]>().to_vec()
            }
        };
        Self::new(
            &secret,
            Duration::minutes(config.access_ttl_minutes.clamp(1, MAX_ACCESS_TTL_MINUTES)),
            Duration::days(config.refresh_ttl_days.clamp(1, MAX_REFRESH_TTL_DAYS)),
        )
    }

    pub fn issue(&self, user: &User, kind: TokenKind) -> Result<String, AppError> {
        let now = Utc::now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role,
            kind,
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key).map_err(signing_failed)
    }

    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access: self.issue(user, TokenKind::Access)?,
            refresh: self.issue(user, TokenKind::Refresh)?,
        })
    }

    /// Decode a token and check that it is of the expected kind
    pub fn validate(&self, token: &str, kind: TokenKind) -> Result<Claims, AppError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!(error = %e, "Token rejected");
                AppError::unauthorized("Invalid or expired token")
            })?
            .claims;

        if claims.kind != kind {
            return Err(AppError::unauthorized("Invalid or expired token"));
        }
        Ok(claims)
    }
}

fn signing_failed(e: jsonwebtoken::errors::Error) -> AppError {
    error!(error = %e, "Failed to sign token");
    AppError::internal("An internal error occurred")
}

/// Hex SHA-256 of a token id, as stored in the revocation list
pub fn token_digest(jti: &str) -> String {
    hex::encode(Sha256::digest(jti.as_bytes()))
}

/// The authenticated user, inserted into request extensions by [`require_jwt`]
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

fn bearer_token(request: &Request) -> Option<&str> {
    let header = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let mut parts = header.splitn(2, ' ');
    let (Some(scheme), Some(token)) = (parts.next(), parts.next()) else {
        return None;
    };
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Require a valid access token belonging to an active user
pub async fn require_jwt(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)
        .ok_or_else(|| AppError::unauthorized("Authentication credentials were not provided"))?;
    let claims = state.auth.validate(token, TokenKind::Access)?;

    let user = state
        .db
        .get_user(claims.user_id()?)?
        .ok_or_else(|| AppError::unauthorized("User not found"))?;
    if !user.is_active {
        return Err(AppError::unauthorized("User account is disabled"));
    }

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

/// Require the authenticated user to be an admin; must run after [`require_jwt`]
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let is_admin = request
        .extensions()
        .get::<CurrentUser>()
        .is_some_and(|u| u.0.is_admin());
    if !is_admin {
        return Err(AppError::forbidden(
            "You do not have permission to perform this action",
        ));
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User {
            id: 7,
            email: "a@example.com".into(),
            username: "a".into(),
            full_name: None,
            phone_no: None,
            role,
            is_active: true,
            last_login: None,
            date_joined: Utc::now(),
        }
    }

    fn manager() -> AuthManager {
        AuthManager::new(b"test-secret", Duration::minutes(5), Duration::days(1))
    }

    #[test]
    fn test_issue_and_validate() {
        let auth = manager();
        let token = auth.issue(&user(Role::Admin), TokenKind::Access).unwrap();
        let claims = auth.validate(&token, TokenKind::Access).unwrap();
        assert_eq!(claims.user_id().unwrap(), 7);
        assert_eq!(claims.role, Role::Admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let auth = manager();
        let pair = auth.issue_pair(&user(Role::User)).unwrap();
        assert!(auth.validate(&pair.refresh, TokenKind::Access).is_err());
        assert!(auth.validate(&pair.access, TokenKind::Refresh).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = manager().issue(&user(Role::User), TokenKind::Access).unwrap();
        let other = AuthManager::new(b"other", Duration::minutes(5), Duration::days(1));
        assert!(other.validate(&token, TokenKind::Access).is_err());
    }

    #[test]
    fn test_signing_failure_is_generic() {
        // An HMAC key cannot sign an RS256 header
        let e = encode(
            &Header::new(Algorithm::RS256),
            &serde_json::json!({ "sub": "7" }),
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap_err();

        let err = signing_failed(e);
        assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "An internal error occurred");
    }

    #[test]
    fn test_config_ttls_are_clamped() {
        let auth = AuthManager::from_config(&AuthSection {
            jwt_secret: Some("test-secret".to_string()),
            access_ttl_minutes: i64::MAX,
            refresh_ttl_days: 0,
        });
        assert_eq!(auth.access_ttl, Duration::minutes(MAX_ACCESS_TTL_MINUTES));
        assert_eq!(auth.refresh_ttl, Duration::days(1));
        assert!(auth.issue_pair(&user(Role::User)).is_ok());
    }

    #[test]
    fn test_token_digest_is_hex_sha256() {
        let digest = token_digest("abc");
        assert_eq!(digest.len(), 64);
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
