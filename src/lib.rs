//! User accounts, roles and JWT sessions for the photo hub backend.
//!
//! Registration, login issuing access/refresh token pairs whose claims carry
//! username and role, refresh, logout backed by a shared Redis blacklist, and
//! profile reads.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;

pub use config::Config;
pub use error::AppError;
pub use handlers::http::AppState;
pub use services::AuthService;

use axum::routing::{get, patch, post};
use handlers::http;
use tower_http::trace::TraceLayer;

/// Build the API router (auth routes and health). Used by main and by integration tests.
pub fn create_app(state: AppState) -> axum::Router {
    let auth_routes = axum::Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route(
            "/profile",
            get(auth::get_profile).patch(auth::update_profile),
        )
        .route("/users", get(auth::list_users))
        .route("/users/:id", patch(auth::update_user));

    axum::Router::new()
        .route("/health", get(http::health))
        .nest("/auth", auth_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
