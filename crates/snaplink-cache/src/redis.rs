use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, RedisError};
use snaplink_core::cache::Result;
use snaplink_core::{CacheError, ShortCode, UrlCache};
use std::time::Duration;
use tracing::{debug, trace, warn};

pub const DEFAULT_KEY_PREFIX: &str = "url:";

/// [`UrlCache`] backed by a shared Redis server.
///
/// Entries are plain string keys `{prefix}{code}` holding the original URL,
/// written with `SET key value EX ttl`. Expiry is left entirely to Redis.
#[derive(Debug, Clone)]
pub struct RedisUrlCache {
    conn: MultiplexedConnection,
    key_prefix: String,
}

impl RedisUrlCache {
    /// Wraps an established connection using the default `url:` prefix.
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self::with_prefix(conn, DEFAULT_KEY_PREFIX)
    }

    pub fn with_prefix(conn: MultiplexedConnection, key_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    /// Opens a client for `redis_url` and establishes a multiplexed
    /// connection.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| CacheError::Initialization(format!("invalid redis url: {e}")))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| classify("connect", e))?;
        Ok(Self::new(conn))
    }

    fn key(&self, code: &ShortCode) -> String {
        let mut key = String::with_capacity(self.key_prefix.len() + code.as_str().len());
        key.push_str(&self.key_prefix);
        key.push_str(code.as_str());
        key
    }
}

fn classify(op: &str, err: RedisError) -> CacheError {
    let message = format!("redis {op}: {err}");
    if err.is_timeout() {
        CacheError::Timeout(message)
    } else if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
        CacheError::Unavailable(message)
    } else {
        CacheError::Operation(message)
    }
}

#[async_trait]
impl UrlCache for RedisUrlCache {
    async fn get_url(&self, code: &ShortCode) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(self.key(code)).await.map_err(|e| {
            warn!(code = %code, error = %e, "redis GET failed");
            classify("GET", e)
        })?;

        if value.is_some() {
            debug!(code = %code, "redis hit");
        } else {
            trace!(code = %code, "redis miss");
        }
        Ok(value)
    }

    async fn set_url(
        &self,
        code: &ShortCode,
        original_url: &str,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let key = self.key(code);
        let mut conn = self.conn.clone();

        let written: std::result::Result<(), RedisError> = match ttl {
            // EX takes whole seconds and rejects zero
            Some(ttl) => conn.set_ex(key, original_url, ttl.as_secs().max(1)).await,
            None => conn.set(key, original_url).await,
        };

        written.map_err(|e| {
            warn!(code = %code, error = %e, "redis SET failed");
            classify("SET", e)
        })?;
        trace!(code = %code, ttl = ?ttl, "redis entry written");
        Ok(())
    }
}
