//! Bearer-token extractor: turns a valid access token into an explicit `Identity`.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use tracing::debug;

use crate::auth::TokenType;
use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::models::Identity;

const MISSING_CREDENTIALS: &str = "Authentication credentials were not provided.";
const INVALID_ACCESS_TOKEN: &str = "Given token not valid for any token type";

/// Extractor: authenticated caller from `Authorization: Bearer <access token>`.
#[derive(Clone, Debug)]
pub struct AuthUser(pub Identity);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Auth(MISSING_CREDENTIALS.to_string()))?;

        let claims = state
            .tokens()
            .decode(bearer.token(), TokenType::Access)
            .map_err(|e| {
                debug!(error = %e, "rejected access token");
                AppError::Auth(INVALID_ACCESS_TOKEN.to_string())
            })?;
        let user_id = claims
            .user_id()
            .map_err(|_| AppError::Auth(INVALID_ACCESS_TOKEN.to_string()))?;

        Ok(AuthUser(Identity {
            user_id,
            username: claims.username,
            role: claims.role,
        }))
    }
}
