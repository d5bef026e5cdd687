//! Entry point: load config, wire dependencies, and run the server.

use axum::http::HeaderValue;
use photohub_auth::auth::TokenIssuer;
use photohub_auth::config::Config;
use photohub_auth::db::{self, PgProfileExtensions, PgUserStore};
use photohub_auth::repositories::RedisBlacklist;
use photohub_auth::services::AuthService;
use photohub_auth::{create_app, AppState};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("config: {}", e))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    let blacklist = RedisBlacklist::new(&config.redis_url)?;
    let tokens = TokenIssuer::new(
        &config.jwt_secret,
        config.access_token_ttl_secs,
        config.refresh_token_ttl_secs,
    );
    let auth_service = AuthService::new(
        Arc::new(PgUserStore::new(db_pool.clone())),
        Arc::new(PgProfileExtensions::new(db_pool)),
        Arc::new(blacklist),
        tokens,
    );

    let app = create_app(AppState::new(auth_service)).layer(cors_layer(&config)?);

    tracing::info!(addr = %config.server_addr, "listening");
    let listener = tokio::net::TcpListener::bind(config.server_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Explicit origins when configured, otherwise any origin.
fn cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    if config.cors_allowed_origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }
    let origins = config
        .cors_allowed_origins
        .iter()
        .map(|o| o.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| anyhow::anyhow!("CORS_ALLOWED_ORIGINS: {}", e))?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any))
}
