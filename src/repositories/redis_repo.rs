//! Redis-backed token blacklist, shared by every server instance.

use crate::error::AppError;
use async_trait::async_trait;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::TokenBlacklist;

const BLACKLIST_PREFIX: &str = "photohub:blacklist:";

fn blacklist_key(jti: &str) -> String {
    format!("{}{}", BLACKLIST_PREFIX, jti)
}

/// Revoked `jti`s stored as expiring keys; an entry disappears once the token
/// it names would have expired anyway.
#[derive(Clone)]
pub struct RedisBlacklist {
    client: Arc<redis::Client>,
}

impl RedisBlacklist {
    /// Create repository from Redis URL.
    pub fn new(redis_url: &str) -> Result<Self, AppError> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Get a multiplexed connection for commands.
    pub async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, AppError> {
        let conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn)
    }
}

#[async_trait]
impl TokenBlacklist for RedisBlacklist {
    async fn revoke(&self, jti: &str, ttl: Duration) -> Result<bool, AppError> {
        let mut conn = self.connection().await?;
        let key = blacklist_key(jti);
        // SET NX makes revocation atomic across instances.
        let reply: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(1)
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await?;
        let inserted = reply.is_some();
        debug!(jti = %jti, inserted, ttl_secs = ttl.as_secs(), "blacklist insert");
        Ok(inserted)
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, AppError> {
        let mut conn = self.connection().await?;
        let revoked: bool = conn.exists(blacklist_key(jti)).await?;
        Ok(revoked)
    }
}
