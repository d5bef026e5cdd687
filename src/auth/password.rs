//! Password hashing, verification and strength policy.

use crate::error::{AppError, AppResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::OnceLock;
use validator::ValidateEmail;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

const COMMON_PASSWORDS: &[&str] = &[
    "password",
    "password1",
    "password123",
    "12345678",
    "123456789",
    "1234567890",
    "qwerty123",
    "qwertyuiop",
    "iloveyou",
    "sunshine1",
    "letmein1",
    "football",
    "baseball",
    "welcome1",
    "admin123",
    "abc12345",
    "trustno1",
    "princess1",
    "photography",
];

pub struct PasswordHasherService;

impl PasswordHasherService {
    pub fn hash_password(password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("hash: {}", e)))?
            .to_string();
        Ok(hash)
    }

    pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
        let parsed =
            PasswordHash::new(hash).map_err(|e| AppError::Internal(anyhow::anyhow!("parse hash: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Burn one verification against a fixed hash. Used when the account does
    /// not exist so the response time matches a wrong-password attempt.
    pub fn verify_dummy(password: &str) {
        static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();
        let dummy = DUMMY_HASH.get_or_init(|| Self::hash_password("photohub-timing-equalizer").ok());
        if let Some(hash) = dummy {
            let _ = Self::verify_password(password, hash);
        }
    }

    pub fn validate_email(email: &str) -> AppResult<()> {
        if !email.validate_email() {
            return Err(AppError::Validation("Invalid email".to_string()));
        }
        Ok(())
    }

    /// Reject short, numeric-only, common, or account-derived passwords.
    pub fn validate_strength(password: &str, username: &str, email: &str) -> AppResult<()> {
        let len = password.chars().count();
        if len < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "This password is too short. It must contain at least {} characters.",
                MIN_PASSWORD_LEN
            )));
        }
        if len > MAX_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "This password is too long. It must contain at most {} characters.",
                MAX_PASSWORD_LEN
            )));
        }
        if password.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::Validation(
                "This password is entirely numeric.".to_string(),
            ));
        }

        let lowered = password.to_lowercase();
        if COMMON_PASSWORDS.contains(&lowered.as_str()) {
            return Err(AppError::Validation(
                "This password is too common.".to_string(),
            ));
        }

        let local_part = email.split('@').next().unwrap_or_default();
        for attr in [username, local_part] {
            let attr = attr.to_lowercase();
            if attr.chars().count() < 3 {
                continue;
            }
            if lowered.contains(&attr) || attr.contains(&lowered) {
                return Err(AppError::Validation(
                    "The password is too similar to the username or email.".to_string(),
                ));
            }
        }
        Ok(())
    }
}
