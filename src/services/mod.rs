//! Business logic: the identity lifecycle.

pub mod auth;

pub use auth::AuthService;
