use anyhow::Context;
use clap::Parser;
use snaplink_cache::{MokaUrlCache, NoopCache, RedisUrlCache, UrlCache};
use snaplink_gateway::config::{CacheBackendArg, StorageBackendArg, CLI};
use snaplink_gateway::{telemetry, App, AppState};
use snaplink_generator::random::RandomGenerator;
use snaplink_shortener::{MetricsRecorder, ShortenerService};
use snaplink_storage::{InMemoryRepository, MySqlRepository, Repository};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

const METRICS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();

    let _telemetry = telemetry::init(
        config.log_format,
        &config.log_filter,
        config.otlp_endpoint.as_deref(),
    )
    .context("failed to initialise telemetry")?;

    info!(
        listen_addr = %config.listen_addr,
        base_url = %config.base_url,
        storage_backend = %config.storage,
        cache_backend = %config.cache,
        code_length = config.code_length,
        "starting snaplink gateway"
    );

    let repository = build_repository(&config).await?;
    let cache = build_cache(&config).await?;
    let generator = RandomGenerator::alphanumeric(config.code_length)
        .context("invalid short code length")?;

    let (metrics, worker) = MetricsRecorder::spawn(Arc::clone(&repository), config.metrics_config());
    let service = ShortenerService::new(
        repository,
        cache,
        generator,
        metrics,
        config.shortener_config(),
    );
    let state = AppState::new(Arc::new(service), config.base_url.clone());

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(listen_addr = %listener.local_addr()?, "listening");

    axum::serve(listener, App::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;

    info!("http server stopped, draining metrics queue");
    if tokio::time::timeout(METRICS_DRAIN_TIMEOUT, worker.join())
        .await
        .is_err()
    {
        warn!("metrics queue was not drained before the deadline");
    }

    Ok(())
}

async fn build_repository(config: &CLI) -> anyhow::Result<Arc<dyn Repository>> {
    match config.storage {
        StorageBackendArg::InMemory => Ok(Arc::new(InMemoryRepository::new())),
        StorageBackendArg::Mysql => {
            let mysql_dsn = config
                .mysql_dsn
                .as_deref()
                .context("mysql dsn is required when storage backend is mysql")?;
            let repository = MySqlRepository::connect(mysql_dsn)
                .await
                .context("failed to connect to mysql")?;
            repository
                .migrate()
                .await
                .context("failed to run mysql migrations")?;
            Ok(Arc::new(repository))
        }
    }
}

async fn build_cache(config: &CLI) -> anyhow::Result<Arc<dyn UrlCache>> {
    match config.cache {
        CacheBackendArg::None => Ok(Arc::new(NoopCache)),
        CacheBackendArg::Memory => Ok(Arc::new(MokaUrlCache::new())),
        CacheBackendArg::Redis => {
            let redis_url = config
                .redis_url
                .as_deref()
                .context("redis url is required when cache backend is redis")?;
            let cache = RedisUrlCache::connect(redis_url)
                .await
                .context("failed to connect to redis")?;
            Ok(Arc::new(cache))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
