//! Data models for user accounts.

pub mod user;

pub use user::*;
