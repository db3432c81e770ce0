use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use snaplink_core::cache::Result;
use snaplink_core::{ShortCode, UrlCache};
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use typed_builder::TypedBuilder;

const DEFAULT_MAX_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone)]
struct CachedUrl {
    original_url: String,
    ttl: Option<Duration>,
}

/// Expires each entry after the TTL it was written with.
struct PerEntryTtl;

impl Expiry<String, CachedUrl> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedUrl,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedUrl,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }
}

/// Process-local [`UrlCache`] on top of moka.
///
/// Entries expire individually after the TTL passed to
/// [`UrlCache::set_url`]; an entry written without a TTL lives until it is
/// evicted by capacity pressure. Suited to single-node deployments.
#[derive(Clone)]
pub struct MokaUrlCache {
    cache: Cache<String, CachedUrl>,
}

impl MokaUrlCache {
    /// Holds up to 10,000 entries.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_CAPACITY)
    }

    pub fn with_capacity(max_capacity: u64) -> Self {
        MokaCacheConfig::builder()
            .max_capacity(max_capacity)
            .build()
            .into()
    }

    pub fn builder() -> MokaCacheConfigBuilder {
        MokaCacheConfig::builder()
    }
}

impl Default for MokaUrlCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MokaUrlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaUrlCache")
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}

#[async_trait]
impl UrlCache for MokaUrlCache {
    async fn get_url(&self, code: &ShortCode) -> Result<Option<String>> {
        trace!(code = %code, "Fetching URL from Moka cache");

        match self.cache.get(code.as_str()).await {
            Some(entry) => {
                debug!(code = %code, "Cache hit in Moka");
                Ok(Some(entry.original_url))
            }
            None => {
                trace!(code = %code, "Cache miss in Moka");
                Ok(None)
            }
        }
    }

    async fn set_url(
        &self,
        code: &ShortCode,
        original_url: &str,
        ttl: Option<Duration>,
    ) -> Result<()> {
        trace!(code = %code, "Storing URL in Moka cache");

        let entry = CachedUrl {
            original_url: original_url.to_string(),
            ttl,
        };
        self.cache.insert(code.as_str().to_string(), entry).await;
        debug!(code = %code, ttl = ?ttl, "Cached URL in Moka");
        Ok(())
    }
}

/// Sizing and idle expiry for [`MokaUrlCache`].
#[derive(Debug, TypedBuilder, Default)]
pub struct MokaCacheConfig {
    /// Entry bound; least recently used entries are evicted past it.
    #[builder(default, setter(strip_option))]
    max_capacity: Option<u64>,
    /// Time-to-idle applied on top of each entry's own TTL.
    #[builder(default, setter(strip_option))]
    tti: Option<Duration>,
}

impl From<MokaCacheConfig> for MokaUrlCache {
    fn from(config: MokaCacheConfig) -> Self {
        let mut builder = Cache::builder()
            .max_capacity(config.max_capacity.unwrap_or(DEFAULT_MAX_CAPACITY))
            .expire_after(PerEntryTtl);

        if let Some(tti) = config.tti {
            builder = builder.time_to_idle(tti);
        }

        MokaUrlCache {
            cache: builder.build(),
        }
    }
}
