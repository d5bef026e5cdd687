//! Storage seams used by the auth service: users, profile extensions, token blacklist.
//!
//! Production wiring uses PostgreSQL (`crate::db`) and Redis; the in-memory
//! versions back tests and single-process local runs.

pub mod memory;
pub mod redis_repo;

pub use memory::{MemoryBlacklist, MemoryProfileExtensions, MemoryUserStore};
pub use redis_repo::RedisBlacklist;

use crate::error::AppResult;
use crate::models::{AccountUpdate, NewUser, ProfileUpdate, User, UserFilter};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

/// Persistence of user accounts. Username and email are unique; a violation
/// on insert is reported as `AppError::Conflict`.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: NewUser) -> AppResult<User>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    async fn username_taken(&self, username: &str) -> AppResult<bool>;

    async fn email_taken(&self, email: &str) -> AppResult<bool>;

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()>;

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> AppResult<Option<User>>;

    async fn update_account(&self, id: Uuid, update: AccountUpdate) -> AppResult<Option<User>>;

    /// Matching users, oldest first.
    async fn list(&self, filter: &UserFilter) -> AppResult<Vec<User>>;
}

/// Display attributes that live outside the core user record.
#[async_trait]
pub trait ProfileExtensions: Send + Sync {
    async fn studio_name(&self, user_id: Uuid) -> AppResult<Option<String>>;
}

/// Shared registry of revoked refresh tokens, keyed by `jti`.
#[async_trait]
pub trait TokenBlacklist: Send + Sync {
    /// Revoke `jti` for `ttl`. Returns `false` if it was already revoked.
    async fn revoke(&self, jti: &str, ttl: Duration) -> AppResult<bool>;

    async fn is_revoked(&self, jti: &str) -> AppResult<bool>;
}
