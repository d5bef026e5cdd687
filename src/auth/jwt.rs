//! JWT access/refresh token issue and validation.

use crate::error::{AppError, AppResult};
use crate::models::{Role, User};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims carried by both token types. `username` and `role` let consumers
/// authorize without a user lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub exp: i64,
    pub iat: i64,
    /// Unique per token; the blacklist key.
    pub jti: String,
    pub token_type: TokenType,
    pub username: String,
    pub role: Role,
}

impl Claims {
    pub fn user_id(&self) -> AppResult<Uuid> {
        Uuid::parse_str(&self.sub)
            .map_err(|e| AppError::InvalidToken(format!("bad subject: {}", e)))
    }

    /// Time until the token stops decoding. `exp` is whole seconds and still
    /// valid during its own second, so that second is included.
    pub fn remaining_lifetime(&self) -> std::time::Duration {
        let secs = (self.exp - Utc::now().timestamp() + 1).max(1);
        std::time::Duration::from_secs(secs as u64)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Signs and verifies tokens. Keys are built once; clones share them.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            access_ttl: Duration::seconds(access_ttl_secs),
            refresh_ttl: Duration::seconds(refresh_ttl_secs),
        }
    }

    pub fn issue_pair(&self, user: &User) -> AppResult<TokenPair> {
        Ok(TokenPair {
            access: self.issue_access(user)?,
            refresh: self.issue(user, TokenType::Refresh, self.refresh_ttl)?,
        })
    }

    pub fn issue_access(&self, user: &User) -> AppResult<String> {
        self.issue(user, TokenType::Access, self.access_ttl)
    }

    fn issue(&self, user: &User, token_type: TokenType, ttl: Duration) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().simple().to_string(),
            token_type,
            username: user.username.clone(),
            role: user.role,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("sign {:?} token: {}", token_type, e)))
    }

    /// Verify signature, expiry and token type. Failures are `InvalidToken`
    /// with the internal reason attached.
    ///
    /// No expiry leeway. Blacklist entries live for `remaining_lifetime` only,
    /// so a token must stop decoding before its entry expires.
    pub fn decode(&self, token: &str, expected: TokenType) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| AppError::InvalidToken(e.to_string()))?;
        if data.claims.token_type != expected {
            return Err(AppError::InvalidToken(format!(
                "expected {:?} token, got {:?}",
                expected, data.claims.token_type
            )));
        }
        Ok(data.claims)
    }
}
