use crate::link::ShortLink;
use crate::shortcode::ShortCode;
use async_trait::async_trait;

type Result<T> = std::result::Result<T, crate::error::ShortenerError>;

/// Where a resolved URL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSource {
    Cache,
    Store,
}

/// The outcome of resolving a short code for a redirect.
///
/// Resolution is redirect-only and carries no metrics; use
/// [`Shortener::stats`] for those.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub short_code: ShortCode,
    pub original_url: String,
    pub source: LookupSource,
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Creates a short link for `original_url` with a freshly generated code.
    async fn shorten(&self, original_url: &str) -> Result<ShortLink>;

    /// Resolves a short code to its original URL and schedules an access
    /// metrics update in the background.
    async fn resolve(&self, code: &ShortCode) -> Result<Resolved>;

    /// Reads the stored link and its metrics, bypassing the cache.
    async fn stats(&self, code: &ShortCode) -> Result<ShortLink>;
}
