use crate::error::CacheError;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use std::time::Duration;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Default lifetime of a cached short code mapping.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// A cache mapping short codes to original URLs.
///
/// The cache is never authoritative: entries may vanish at any time, and
/// callers treat every error as a miss.
#[async_trait]
pub trait UrlCache: Send + Sync + 'static {
    /// Get the original URL for a short code.
    ///
    /// Returns `Ok(None)` if the key is not in the cache.
    async fn get_url(&self, code: &ShortCode) -> Result<Option<String>>;

    /// Store the original URL for a short code with optional TTL.
    ///
    /// If `ttl` is `None`, the entry may persist indefinitely or use
    /// a default expiration policy depending on the implementation.
    async fn set_url(&self, code: &ShortCode, original_url: &str, ttl: Option<Duration>)
        -> Result<()>;
}
