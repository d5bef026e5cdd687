//! User accounts and roles.

use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Closed set of user roles. Drives every authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Photographer,
    Representative,
    #[default]
    Student,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Admin,
        Role::Photographer,
        Role::Representative,
        Role::Student,
    ];

    /// Stored and wire representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Photographer => "photographer",
            Role::Representative => "representative",
            Role::Student => "student",
        }
    }

    /// Human-readable label for listings.
    pub const fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Admin / Management",
            Role::Photographer => "Photographer",
            Role::Representative => "Representative Student",
            Role::Student => "Basic Student",
        }
    }

    /// Single authorization check: is this role among `allowed`?
    pub fn permits(&self, allowed: &[Role]) -> bool {
        allowed.contains(self)
    }

    /// `permits`, as a `Forbidden` error for handlers and services.
    pub fn require(&self, allowed: &[Role]) -> AppResult<()> {
        if self.permits(allowed) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You do not have permission to perform this action.".to_string(),
            ))
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0:?}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// A persisted user account.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub is_staff: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.username, self.role.label())
    }
}

/// Fields for inserting a user; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
}

/// Self-service profile changes. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[serde(default)]
    #[validate(length(max = 20))]
    pub phone_number: Option<String>,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

/// Admin-only account changes. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub role: Option<Role>,
    pub is_staff: Option<bool>,
    pub is_active: Option<bool>,
}

impl AccountUpdate {
    pub fn is_empty(&self) -> bool {
        self.role.is_none() && self.is_staff.is_none() && self.is_active.is_none()
    }
}

/// Filter for admin listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_staff: Option<bool>,
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        self.role.map_or(true, |r| r == user.role)
            && self.is_active.map_or(true, |a| a == user.is_active)
            && self.is_staff.map_or(true, |s| s == user.is_staff)
    }
}

/// The authenticated caller, decoded from an access token and passed
/// explicitly into every service call that needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
}

impl Identity {
    pub fn require_role(&self, allowed: &[Role]) -> AppResult<()> {
        self.role.require(allowed)
    }
}

/// Normalize an email address by lowercasing the domain part.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}
