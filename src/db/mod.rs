//! Database layer: pool and PostgreSQL stores.
//!
//! Expected schema (managed outside this crate):
//!
//! ```sql
//! CREATE TABLE users (
//!     id              UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     username        VARCHAR(150) NOT NULL UNIQUE,
//!     email           VARCHAR(254) NOT NULL UNIQUE,
//!     password_hash   TEXT NOT NULL,
//!     role            VARCHAR(20) NOT NULL DEFAULT 'student'
//!                     CHECK (role IN ('admin', 'photographer', 'representative', 'student')),
//!     phone_number    VARCHAR(20),
//!     profile_picture VARCHAR(255),
//!     bio             TEXT,
//!     is_staff        BOOLEAN NOT NULL DEFAULT FALSE,
//!     is_active       BOOLEAN NOT NULL DEFAULT TRUE,
//!     date_joined     TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     last_login      TIMESTAMPTZ
//! );
//!
//! CREATE TABLE photographer_profiles (
//!     user_id     UUID PRIMARY KEY REFERENCES users(id),
//!     studio_name VARCHAR(255)
//! );
//! ```

mod pool;
mod repositories;

pub use pool::{create_pool, DbPool};
pub use repositories::*;
