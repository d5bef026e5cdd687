//! Auth HTTP handlers: register, login, refresh, logout, profile, admin user tools.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::handlers::http::AppState;
use crate::middleware::AuthUser;
use crate::models::{AccountUpdate, ProfileUpdate, Role, User, UserFilter};
use crate::services::auth::{LogoutFailure, Profile, RefreshedAccess, Registration, Session};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AccountUpdateRequest {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub is_staff: Option<bool>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Public representation of an account.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub date_joined: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username,
            email: user.email,
            role: user.role,
            phone_number: user.phone_number,
            profile_picture: user.profile_picture,
            bio: user.bio,
            date_joined: user.date_joined.to_rfc3339(),
        }
    }
}

/// Row in the admin user listing.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub display: String,
    pub email: String,
    pub role: Role,
    pub is_staff: bool,
    pub is_active: bool,
    pub date_joined: String,
    pub last_login: Option<String>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            display: user.to_string(),
            username: user.username,
            email: user.email,
            role: user.role,
            is_staff: user.is_staff,
            is_active: user.is_active,
            date_joined: user.date_joined.to_rfc3339(),
            last_login: user.last_login.map(|t| t.to_rfc3339()),
        }
    }
}

/// Malformed JSON is a validation failure (400), not axum's default 415/422.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    body.map(|Json(inner)| inner)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

/// Bad query strings and path segments get the same JSON error body.
fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> AppResult<T> {
    query
        .map(|Query(inner)| inner)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

fn path_param<T>(path: Result<Path<T>, PathRejection>) -> AppResult<T> {
    path.map(|Path(inner)| inner)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    body: Result<Json<Registration>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let registration = json_body(body)?;
    let caller = caller.map(|AuthUser(identity)| identity);
    let user = state
        .auth_service()
        .register(caller.as_ref(), registration)
        .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Session>, AppError> {
    let body = json_body(body)?;
    let session = state
        .auth_service()
        .login(&body.username, &body.password)
        .await?;
    Ok(Json(session))
}

/// POST /auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<RefreshedAccess>, AppError> {
    let body = json_body(body)?;
    let access = state.auth_service().refresh(&body.refresh).await?;
    Ok(Json(access))
}

/// POST /auth/logout. 205 on success, 400 on any failure.
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    body: Result<Json<LogoutRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let service = state.auth_service();
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            return Err(service.reject_logout(
                &identity,
                LogoutFailure::MalformedBody(rejection.body_text()),
            ))
        }
    };
    service.logout(&identity, body.refresh.as_deref()).await?;
    Ok(StatusCode::RESET_CONTENT)
}

/// GET /auth/profile
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Profile>, AppError> {
    let profile = state.auth_service().profile(&identity).await?;
    Ok(Json(profile))
}

/// PATCH /auth/profile
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    body: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<UserResponse>, AppError> {
    let update = json_body(body)?;
    let user = state
        .auth_service()
        .update_profile(&identity, update)
        .await?;
    Ok(Json(user.into()))
}

/// GET /auth/users, admin only.
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    filter: Result<Query<UserFilter>, QueryRejection>,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    let filter = query_params(filter)?;
    let users = state.auth_service().list_users(&identity, &filter).await?;
    Ok(Json(users.into_iter().map(UserSummary::from).collect()))
}

/// PATCH /auth/users/:id, admin only.
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<AccountUpdateRequest>, JsonRejection>,
) -> Result<Json<UserSummary>, AppError> {
    let id = path_param(id)?;
    let body = json_body(body)?;
    let role = body
        .role
        .as_deref()
        .map(str::parse::<Role>)
        .transpose()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let update = AccountUpdate {
        role,
        is_staff: body.is_staff,
        is_active: body.is_active,
    };
    let user = state
        .auth_service()
        .update_user(&identity, id, update)
        .await?;
    Ok(Json(user.into()))
}
