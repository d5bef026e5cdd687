//! Authentication: credentials, JWT sessions, HTTP handlers.

mod handlers;
mod jwt;
mod password;

pub use handlers::{
    get_profile, list_users, login, logout, refresh, register, update_profile, update_user,
    UserResponse, UserSummary,
};
pub use jwt::{Claims, TokenIssuer, TokenPair, TokenType};
pub use password::PasswordHasherService;
