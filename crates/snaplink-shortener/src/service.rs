use crate::metrics::MetricsRecorder;
use async_trait::async_trait;
use snaplink_core::{
    LookupSource, NewShortLink, Repository, Resolved, ShortCode, ShortLink, Shortener,
    ShortenerError, StorageError, UrlCache, DEFAULT_CACHE_TTL,
};
use snaplink_generator::Generator;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use typed_builder::TypedBuilder;
use url::Url;

/// Upper bound on code generation attempts for a single `shorten` call.
pub const DEFAULT_MAX_ATTEMPTS: usize = 1000;

/// Tunables for [`ShortenerService`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct ShortenerConfig {
    #[builder(default = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: usize,
    /// Lifetime of cache entries written on creation and on store hits.
    #[builder(default = DEFAULT_CACHE_TTL)]
    pub cache_ttl: Duration,
}

impl Default for ShortenerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A concrete implementation of the `Shortener` trait.
///
/// This service wraps a `Repository`, a `UrlCache` and a `Generator` to
/// handle:
/// - Short code allocation with bounded collision retry
/// - URL validation
/// - Cache-first resolution with best-effort cache population
/// - Handing access metrics to the background updater
///
/// The store's unique constraint on short codes is authoritative; the
/// existence check only avoids a failed insert in the common case.
pub struct ShortenerService<R: ?Sized, C: ?Sized, G> {
    repository: Arc<R>,
    cache: Arc<C>,
    generator: G,
    metrics: MetricsRecorder,
    config: ShortenerConfig,
}

impl<R, C, G> ShortenerService<R, C, G>
where
    R: Repository + ?Sized,
    C: UrlCache + ?Sized,
    G: Generator,
{
    pub fn new(
        repository: Arc<R>,
        cache: Arc<C>,
        generator: G,
        metrics: MetricsRecorder,
        config: ShortenerConfig,
    ) -> Self {
        Self {
            repository,
            cache,
            generator,
            metrics,
            config,
        }
    }

    pub fn config(&self) -> &ShortenerConfig {
        &self.config
    }

    /// Accepts absolute http(s) URLs with a non-empty host.
    fn validate_url(original_url: &str) -> Result<(), ShortenerError> {
        if original_url.trim().is_empty() {
            return Err(ShortenerError::InvalidUrl(
                "URL cannot be empty".to_string(),
            ));
        }

        // the parser strips these silently, so the stored string would not
        // match what the redirect points at
        if original_url
            .chars()
            .any(|c| c.is_control() || c.is_whitespace())
        {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL must not contain whitespace or control characters: {original_url:?}"
            )));
        }

        let parsed = Url::parse(original_url).map_err(|e| {
            ShortenerError::InvalidUrl(format!("{original_url}: {e}"))
        })?;

        match parsed.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ShortenerError::InvalidUrl(format!(
                    "URL scheme must be http or https: {other}"
                )));
            }
        }

        match parsed.host_str() {
            Some(host) if !host.is_empty() => Ok(()),
            _ => Err(ShortenerError::InvalidUrl(format!(
                "URL must have a host: {original_url}"
            ))),
        }
    }

    /// Writes `code -> original_url` to the cache. Failures are logged and
    /// otherwise ignored.
    async fn populate_cache(&self, code: &ShortCode, original_url: &str) {
        if let Err(e) = self
            .cache
            .set_url(code, original_url, Some(self.config.cache_ttl))
            .await
        {
            warn!(code = %code, error = %e, "failed to populate cache");
        }
    }
}

#[async_trait]
impl<R, C, G> Shortener for ShortenerService<R, C, G>
where
    R: Repository + ?Sized,
    C: UrlCache + ?Sized,
    G: Generator,
{
    async fn shorten(&self, original_url: &str) -> Result<ShortLink, ShortenerError> {
        Self::validate_url(original_url)?;

        let max_attempts = self.config.max_attempts;
        for attempt in 1..=max_attempts {
            let code = self.generator.generate();

            if self.repository.exists(&code).await? {
                debug!(code = %code, attempt, "generated code already taken, retrying");
                continue;
            }

            match self
                .repository
                .insert(&code, NewShortLink::new(original_url))
                .await
            {
                Ok(link) => {
                    info!(code = %code, attempt, "created short link");
                    self.populate_cache(&code, &link.original_url).await;
                    return Ok(link);
                }
                // lost a race for the same code
                Err(StorageError::Conflict(_)) => {
                    warn!(code = %code, attempt, "short code claimed concurrently, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        error!(attempts = max_attempts, "no free short code found");
        Err(ShortenerError::CodeSpaceExhausted {
            attempts: max_attempts,
        })
    }

    async fn resolve(&self, code: &ShortCode) -> Result<Resolved, ShortenerError> {
        let started = Instant::now();

        match self.cache.get_url(code).await {
            Ok(Some(original_url)) => {
                debug!(code = %code, "cache HIT");
                self.metrics.record(code.clone(), started);
                return Ok(Resolved {
                    short_code: code.clone(),
                    original_url,
                    source: LookupSource::Cache,
                });
            }
            Ok(None) => debug!(code = %code, "cache MISS"),
            Err(e) => warn!(code = %code, error = %e, "cache lookup failed, falling back to store"),
        }

        let link = self
            .repository
            .get(code)
            .await?
            .ok_or_else(|| ShortenerError::NotFound(code.to_string()))?;

        self.metrics.record(code.clone(), started);
        self.populate_cache(code, &link.original_url).await;

        Ok(Resolved {
            short_code: link.short_code,
            original_url: link.original_url,
            source: LookupSource::Store,
        })
    }

    async fn stats(&self, code: &ShortCode) -> Result<ShortLink, ShortenerError> {
        self.repository
            .get(code)
            .await?
            .ok_or_else(|| ShortenerError::NotFound(code.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MetricsConfig, MetricsWorker};
    use snaplink_cache::MokaUrlCache;
    use snaplink_core::repository::ReadRepository;
    use snaplink_core::{Access, CacheError};
    use snaplink_generator::random::RandomGenerator;
    use snaplink_storage::InMemoryRepository;
    use std::collections::{HashSet, VecDeque};
    use std::sync::Mutex;

    type TestService<C, G> = ShortenerService<InMemoryRepository, C, G>;

    struct Harness<C, G> {
        service: TestService<C, G>,
        repo: Arc<InMemoryRepository>,
        cache: Arc<C>,
        worker: MetricsWorker,
    }

    fn harness_with<C, G>(cache: C, generator: G, config: ShortenerConfig) -> Harness<C, G>
    where
        C: UrlCache,
        G: Generator,
    {
        let repo = Arc::new(InMemoryRepository::new());
        let cache = Arc::new(cache);
        let (metrics, worker) =
            MetricsRecorder::spawn(Arc::clone(&repo), MetricsConfig::default());
        let service = ShortenerService::new(
            Arc::clone(&repo),
            Arc::clone(&cache),
            generator,
            metrics,
            config,
        );
        Harness {
            service,
            repo,
            cache,
            worker,
        }
    }

    fn harness() -> Harness<MokaUrlCache, RandomGenerator> {
        harness_with(
            MokaUrlCache::new(),
            RandomGenerator::default(),
            ShortenerConfig::default(),
        )
    }

    fn code(s: &str) -> ShortCode {
        ShortCode::new_unchecked(s)
    }

    /// Hands out a fixed sequence of codes, repeating the last one.
    struct ScriptedGenerator {
        codes: Mutex<VecDeque<&'static str>>,
        last: Mutex<&'static str>,
    }

    impl ScriptedGenerator {
        fn new(codes: &[&'static str]) -> Self {
            Self {
                codes: Mutex::new(codes.iter().copied().collect()),
                last: Mutex::new(codes[codes.len() - 1]),
            }
        }
    }

    impl Generator for ScriptedGenerator {
        fn generate(&self) -> ShortCode {
            let next = self.codes.lock().unwrap().pop_front();
            match next {
                Some(c) => {
                    *self.last.lock().unwrap() = c;
                    code(c)
                }
                None => code(*self.last.lock().unwrap()),
            }
        }
    }

    /// A cache that is always down.
    struct UnavailableCache;

    #[async_trait]
    impl UrlCache for UnavailableCache {
        async fn get_url(&self, _code: &ShortCode) -> snaplink_core::cache::Result<Option<String>> {
            Err(CacheError::Unavailable("connection refused".to_string()))
        }

        async fn set_url(
            &self,
            _code: &ShortCode,
            _original_url: &str,
            _ttl: Option<Duration>,
        ) -> snaplink_core::cache::Result<()> {
            Err(CacheError::Unavailable("connection refused".to_string()))
        }
    }

    /// Store whose existence check never sees a taken code, so collisions
    /// only surface as insert conflicts.
    #[derive(Default)]
    struct BlindRepository {
        inner: InMemoryRepository,
    }

    #[async_trait]
    impl ReadRepository for BlindRepository {
        async fn get(
            &self,
            code: &ShortCode,
        ) -> snaplink_core::repository::Result<Option<ShortLink>> {
            self.inner.get(code).await
        }

        async fn exists(&self, _code: &ShortCode) -> snaplink_core::repository::Result<bool> {
            Ok(false)
        }
    }

    #[async_trait]
    impl Repository for BlindRepository {
        async fn insert(
            &self,
            code: &ShortCode,
            link: NewShortLink,
        ) -> snaplink_core::repository::Result<ShortLink> {
            self.inner.insert(code, link).await
        }

        async fn record_access(
            &self,
            code: &ShortCode,
            access: Access,
        ) -> snaplink_core::repository::Result<Option<ShortLink>> {
            self.inner.record_access(code, access).await
        }
    }

    /// Polls `stats` until the click count reaches `clicks`.
    async fn wait_for_clicks<C, G>(
        service: &TestService<C, G>,
        short_code: &ShortCode,
        clicks: u64,
    ) -> ShortLink
    where
        C: UrlCache,
        G: Generator,
    {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let link = service.stats(short_code).await.unwrap();
                if link.metrics.clicks >= clicks {
                    return link;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("metrics update was not applied in time")
    }

    #[tokio::test]
    async fn shorten_creates_alphanumeric_code_with_zero_metrics() {
        let h = harness();

        let link = h.service.shorten("https://www.example.com/").await.unwrap();

        assert_eq!(link.short_code.as_str().len(), 6);
        assert!(link
            .short_code
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(link.original_url, "https://www.example.com/");
        assert_eq!(link.metrics.clicks, 0);
        assert_eq!(link.metrics.avg_response_time_secs, 0.0);
        assert!(link.metrics.last_accessed_at.is_none());
        assert_eq!(link.created_at, link.updated_at);
        assert_eq!(h.repo.len(), 1);
    }

    #[tokio::test]
    async fn shorten_populates_cache() {
        let h = harness();

        let link = h.service.shorten("https://example.com/a?b=c").await.unwrap();

        let cached = h.cache.get_url(&link.short_code).await.unwrap();
        assert_eq!(cached.as_deref(), Some("https://example.com/a?b=c"));
    }

    #[tokio::test]
    async fn resolve_returns_url_unchanged() {
        let h = harness();
        let url = "https://Example.com/Path/../x?q=1#frag";

        let link = h.service.shorten(url).await.unwrap();
        let resolved = h.service.resolve(&link.short_code).await.unwrap();

        assert_eq!(resolved.original_url, url);
        assert_eq!(resolved.short_code, link.short_code);
    }

    #[tokio::test]
    async fn invalid_urls_are_rejected_without_touching_the_store() {
        let h = harness();

        for url in [
            "",
            "   ",
            "invalid-url",
            "ftp://example.com/file",
            "mailto:someone@example.com",
            "https://",
            "/relative/path",
            "https://example.com/\npath",
            "https://exa\tmple.com/",
            " https://example.com",
        ] {
            let err = h.service.shorten(url).await.unwrap_err();
            assert!(
                matches!(err, ShortenerError::InvalidUrl(_)),
                "{url:?} gave {err:?}"
            );
        }

        assert!(h.repo.is_empty());
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let h = harness();
        let missing = code("nonexistent");

        let err = h.service.resolve(&missing).await.unwrap_err();
        assert!(matches!(err, ShortenerError::NotFound(_)));

        let err = h.service.stats(&missing).await.unwrap_err();
        assert!(matches!(err, ShortenerError::NotFound(_)));
    }

    #[tokio::test]
    async fn collision_is_retried_with_a_fresh_code() {
        let h = harness_with(
            MokaUrlCache::new(),
            ScriptedGenerator::new(&["aaaaaa", "aaaaaa", "bbbbbb"]),
            ShortenerConfig::default(),
        );

        let first = h.service.shorten("https://one.example").await.unwrap();
        let second = h.service.shorten("https://two.example").await.unwrap();

        assert_eq!(first.short_code.as_str(), "aaaaaa");
        assert_eq!(second.short_code.as_str(), "bbbbbb");
        assert_eq!(
            h.service.resolve(&first.short_code).await.unwrap().original_url,
            "https://one.example"
        );
    }

    #[tokio::test]
    async fn insert_conflict_counts_as_collision() {
        let repo = Arc::new(BlindRepository::default());
        repo.insert(&code("aaaaaa"), NewShortLink::new("https://taken.example"))
            .await
            .unwrap();
        let (metrics, _worker) =
            MetricsRecorder::spawn(Arc::clone(&repo), MetricsConfig::default());
        let service = ShortenerService::new(
            Arc::clone(&repo),
            Arc::new(MokaUrlCache::new()),
            ScriptedGenerator::new(&["aaaaaa", "cccccc"]),
            metrics,
            ShortenerConfig::default(),
        );

        let link = service.shorten("https://fresh.example").await.unwrap();

        assert_eq!(link.short_code.as_str(), "cccccc");
        let original = repo.get(&code("aaaaaa")).await.unwrap().unwrap();
        assert_eq!(original.original_url, "https://taken.example");
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let h = harness_with(
            MokaUrlCache::new(),
            ScriptedGenerator::new(&["aaaaaa"]),
            ShortenerConfig::builder().max_attempts(5).build(),
        );
        h.service.shorten("https://first.example").await.unwrap();

        let err = h.service.shorten("https://second.example").await.unwrap_err();

        assert!(matches!(
            err,
            ShortenerError::CodeSpaceExhausted { attempts: 5 }
        ));
        assert_eq!(h.repo.len(), 1);
    }

    #[tokio::test]
    async fn small_code_space_fills_without_duplicates() {
        let h = harness_with(
            MokaUrlCache::new(),
            RandomGenerator::new(4, "ab").unwrap(),
            ShortenerConfig::default(),
        );

        let mut seen = HashSet::new();
        for i in 0..16 {
            let link = h
                .service
                .shorten(&format!("https://example.com/{i}"))
                .await
                .unwrap();
            assert!(seen.insert(link.short_code.to_string()));
        }

        let err = h.service.shorten("https://example.com/full").await.unwrap_err();
        assert!(matches!(
            err,
            ShortenerError::CodeSpaceExhausted { attempts: 1000 }
        ));
        assert_eq!(h.repo.len(), 16);
    }

    #[tokio::test]
    async fn cache_hit_is_served_from_cache() {
        let h = harness();
        let link = h.service.shorten("https://example.com").await.unwrap();

        let resolved = h.service.resolve(&link.short_code).await.unwrap();

        assert_eq!(resolved.source, LookupSource::Cache);
        assert_eq!(resolved.original_url, "https://example.com");
    }

    #[tokio::test]
    async fn cache_miss_reads_store_and_backfills_cache() {
        let h = harness();
        let c = code("direct");
        h.repo
            .insert(&c, NewShortLink::new("https://example.com/direct"))
            .await
            .unwrap();

        let first = h.service.resolve(&c).await.unwrap();
        assert_eq!(first.source, LookupSource::Store);
        assert_eq!(
            h.cache.get_url(&c).await.unwrap().as_deref(),
            Some("https://example.com/direct")
        );

        let second = h.service.resolve(&c).await.unwrap();
        assert_eq!(second.source, LookupSource::Cache);
    }

    #[tokio::test]
    async fn cache_outage_degrades_to_store() {
        let h = harness_with(
            UnavailableCache,
            RandomGenerator::default(),
            ShortenerConfig::default(),
        );

        let link = h.service.shorten("https://example.com").await.unwrap();
        let resolved = h.service.resolve(&link.short_code).await.unwrap();

        assert_eq!(resolved.source, LookupSource::Store);
        assert_eq!(resolved.original_url, "https://example.com");
    }

    #[tokio::test]
    async fn resolve_eventually_updates_stats() {
        let h = harness();
        let link = h.service.shorten("https://example.com").await.unwrap();

        h.service.resolve(&link.short_code).await.unwrap();

        let stats = wait_for_clicks(&h.service, &link.short_code, 1).await;
        assert_eq!(stats.metrics.clicks, 1);
        assert!(stats.metrics.last_accessed_at.is_some());
        assert!(stats.metrics.avg_response_time_secs >= 0.0);
        assert!(stats.updated_at >= stats.created_at);
    }

    #[tokio::test]
    async fn stats_does_not_count_as_access() {
        let h = harness();
        let link = h.service.shorten("https://example.com").await.unwrap();

        h.service.stats(&link.short_code).await.unwrap();
        h.service.stats(&link.short_code).await.unwrap();
        drop(h.service);
        h.worker.join().await;

        let stored = h.repo.get(&link.short_code).await.unwrap().unwrap();
        assert_eq!(stored.metrics.clicks, 0);
        assert!(stored.metrics.last_accessed_at.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_resolves_are_all_counted() {
        let h = harness();
        let link = h.service.shorten("https://example.com").await.unwrap();
        let service = Arc::new(h.service);

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..100 {
            let service = Arc::clone(&service);
            let short_code = link.short_code.clone();
            tasks.spawn(async move { service.resolve(&short_code).await.unwrap() });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap();
        }

        drop(service);
        h.worker.join().await;

        let stored = h.repo.get(&link.short_code).await.unwrap().unwrap();
        assert_eq!(stored.metrics.clicks, 100);
    }
}
