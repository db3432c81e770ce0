use async_trait::async_trait;
use snaplink_core::cache::Result;
use snaplink_core::{ShortCode, UrlCache};
use std::time::Duration;

/// A cache that stores nothing. Every lookup is a miss, so the shortener
/// runs store-only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

#[async_trait]
impl UrlCache for NoopCache {
    async fn get_url(&self, _code: &ShortCode) -> Result<Option<String>> {
        Ok(None)
    }

    async fn set_url(
        &self,
        _code: &ShortCode,
        _original_url: &str,
        _ttl: Option<Duration>,
    ) -> Result<()> {
        Ok(())
    }
}
