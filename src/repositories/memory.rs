//! In-process stores. Not shared between processes, so only suitable for
//! tests and single-instance local runs.

use crate::error::{AppError, AppResult};
use crate::models::{AccountUpdate, NewUser, ProfileUpdate, User, UserFilter};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ProfileExtensions, TokenBlacklist, UserStore};

#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, new: NewUser) -> AppResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == new.username) {
            return Err(AppError::Conflict(
                "A user with that username already exists.".to_string(),
            ));
        }
        if users.values().any(|u| u.email == new.email) {
            return Err(AppError::Conflict(
                "A user with that email already exists.".to_string(),
            ));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            phone_number: new.phone_number,
            profile_picture: new.profile_picture,
            bio: new.bio,
            is_staff: false,
            is_active: true,
            date_joined: Utc::now(),
            last_login: None,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn username_taken(&self, username: &str) -> AppResult<bool> {
        Ok(self.users.read().await.values().any(|u| u.username == username))
    }

    async fn email_taken(&self, email: &str) -> AppResult<bool> {
        Ok(self.users.read().await.values().any(|u| u.email == email))
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        if let Some(user) = self.users.write().await.get_mut(&id) {
            user.last_login = Some(at);
        }
        Ok(())
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> AppResult<Option<User>> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(phone) = update.phone_number {
            user.phone_number = Some(phone);
        }
        if let Some(picture) = update.profile_picture {
            user.profile_picture = Some(picture);
        }
        if let Some(bio) = update.bio {
            user.bio = Some(bio);
        }
        Ok(Some(user.clone()))
    }

    async fn update_account(&self, id: Uuid, update: AccountUpdate) -> AppResult<Option<User>> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(role) = update.role {
            user.role = role;
        }
        if let Some(is_staff) = update.is_staff {
            user.is_staff = is_staff;
        }
        if let Some(is_active) = update.is_active {
            user.is_active = is_active;
        }
        Ok(Some(user.clone()))
    }

    async fn list(&self, filter: &UserFilter) -> AppResult<Vec<User>> {
        let mut users: Vec<User> = self
            .users
            .read()
            .await
            .values()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect();
        users.sort_by_key(|u| u.date_joined);
        Ok(users)
    }
}

#[derive(Clone, Default)]
pub struct MemoryProfileExtensions {
    studios: Arc<RwLock<HashMap<Uuid, String>>>,
}

impl MemoryProfileExtensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_studio_name(&self, user_id: Uuid, studio_name: impl Into<String>) {
        self.studios.write().await.insert(user_id, studio_name.into());
    }
}

#[async_trait]
impl ProfileExtensions for MemoryProfileExtensions {
    async fn studio_name(&self, user_id: Uuid) -> AppResult<Option<String>> {
        Ok(self.studios.read().await.get(&user_id).cloned())
    }
}

#[derive(Clone, Default)]
pub struct MemoryBlacklist {
    entries: Arc<RwLock<HashMap<String, Instant>>>,
}

impl MemoryBlacklist {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenBlacklist for MemoryBlacklist {
    async fn revoke(&self, jti: &str, ttl: Duration) -> AppResult<bool> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, expires| *expires > now);
        if entries.contains_key(jti) {
            return Ok(false);
        }
        entries.insert(jti.to_string(), now + ttl);
        Ok(true)
    }

    async fn is_revoked(&self, jti: &str) -> AppResult<bool> {
        Ok(self
            .entries
            .read()
            .await
            .get(jti)
            .is_some_and(|expires| *expires > Instant::now()))
    }
}
