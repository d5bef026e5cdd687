//! PostgreSQL stores: users and photographer profile extensions.

use crate::error::{AppError, AppResult};
use crate::models::{AccountUpdate, NewUser, ProfileUpdate, Role, User, UserFilter};
use crate::repositories::{ProfileExtensions, UserStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::DbPool;

const USER_COLUMNS: &str = "id, username, email, password_hash, role, phone_number, \
     profile_picture, bio, is_staff, is_active, date_joined, last_login";

// ---- User ----

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub is_staff: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: Role = row
            .role
            .parse()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("user {}: {}", row.id, e)))?;
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            role,
            phone_number: row.phone_number,
            profile_picture: row.profile_picture,
            bio: row.bio,
            is_staff: row.is_staff,
            is_active: row.is_active,
            date_joined: row.date_joined,
            last_login: row.last_login,
        })
    }
}

fn into_user(row: Option<UserRow>) -> AppResult<Option<User>> {
    row.map(User::try_from).transpose()
}

/// Unique-index violations become `Conflict`; the index, not a pre-check, is
/// what serializes concurrent registrations.
fn map_insert_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            let field = match db.constraint() {
                Some(c) if c.contains("email") => "email",
                _ => "username",
            };
            return AppError::Conflict(format!("A user with that {} already exists.", field));
        }
    }
    AppError::Db(err)
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: DbPool,
}

impl PgUserStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> AppResult<User> {
        let sql = format!(
            r#"
            INSERT INTO users (username, email, password_hash, role, phone_number, profile_picture, bio)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(&user.phone_number)
            .bind(&user.profile_picture)
            .bind(&user.bio)
            .fetch_one(&self.pool)
            .await
            .map_err(map_insert_error)?;
        row.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        into_user(row)
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        into_user(row)
    }

    async fn username_taken(&self, username: &str) -> AppResult<bool> {
        let (taken,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(taken)
    }

    async fn email_taken(&self, email: &str) -> AppResult<bool> {
        let (taken,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(taken)
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> AppResult<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users SET
                phone_number = COALESCE($2, phone_number),
                profile_picture = COALESCE($3, profile_picture),
                bio = COALESCE($4, bio)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(update.phone_number)
            .bind(update.profile_picture)
            .bind(update.bio)
            .fetch_optional(&self.pool)
            .await?;
        into_user(row)
    }

    async fn update_account(&self, id: Uuid, update: AccountUpdate) -> AppResult<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users SET
                role = COALESCE($2, role),
                is_staff = COALESCE($3, is_staff),
                is_active = COALESCE($4, is_active)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(update.role.map(|r| r.as_str()))
            .bind(update.is_staff)
            .bind(update.is_active)
            .fetch_optional(&self.pool)
            .await?;
        into_user(row)
    }

    async fn list(&self, filter: &UserFilter) -> AppResult<Vec<User>> {
        let sql = format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE ($1::text IS NULL OR role = $1)
              AND ($2::bool IS NULL OR is_active = $2)
              AND ($3::bool IS NULL OR is_staff = $3)
            ORDER BY date_joined ASC
            "#
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(filter.role.map(|r| r.as_str()))
            .bind(filter.is_active)
            .bind(filter.is_staff)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(User::try_from).collect()
    }
}

// ---- Photographer profiles ----

#[derive(Clone)]
pub struct PgProfileExtensions {
    pool: DbPool,
}

impl PgProfileExtensions {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileExtensions for PgProfileExtensions {
    async fn studio_name(&self, user_id: Uuid) -> AppResult<Option<String>> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT studio_name FROM photographer_profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.and_then(|(name,)| name))
    }
}
