use clap::{Parser, ValueEnum};
use snaplink_generator::random::DEFAULT_CODE_LENGTH;
use snaplink_shortener::{MetricsConfig, ShortenerConfig, DEFAULT_MAX_ATTEMPTS};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::time::Duration;

pub const LISTEN_ADDR_ENV: &str = "SNAPLINK_LISTEN_ADDR";
pub const BASE_URL_ENV: &str = "SNAPLINK_BASE_URL";
pub const STORAGE_BACKEND_ENV: &str = "SNAPLINK_STORAGE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "SNAPLINK_MYSQL_DSN";
pub const CACHE_BACKEND_ENV: &str = "SNAPLINK_CACHE_BACKEND";
pub const REDIS_URL_ENV: &str = "SNAPLINK_REDIS_URL";
pub const CACHE_TTL_SECS_ENV: &str = "SNAPLINK_CACHE_TTL_SECS";
pub const CODE_LENGTH_ENV: &str = "SNAPLINK_CODE_LENGTH";
pub const MAX_ATTEMPTS_ENV: &str = "SNAPLINK_MAX_ATTEMPTS";
pub const METRICS_QUEUE_ENV: &str = "SNAPLINK_METRICS_QUEUE";
pub const METRICS_CONCURRENCY_ENV: &str = "SNAPLINK_METRICS_CONCURRENCY";
pub const LOG_FORMAT_ENV: &str = "SNAPLINK_LOG_FORMAT";
pub const LOG_FILTER_ENV: &str = "SNAPLINK_LOG_FILTER";
pub const OTLP_ENDPOINT_ENV: &str = "SNAPLINK_OTLP_ENDPOINT";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
pub const DEFAULT_METRICS_QUEUE: usize = 1024;
pub const DEFAULT_METRICS_CONCURRENCY: usize = 32;
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheBackendArg {
    #[value(name = "none")]
    None,
    #[value(name = "memory")]
    Memory,
    #[value(name = "redis")]
    Redis,
}

impl Display for CacheBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackendArg::None => write!(f, "none"),
            CacheBackendArg::Memory => write!(f, "memory"),
            CacheBackendArg::Redis => write!(f, "redis"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    #[value(name = "text")]
    Text,
    #[value(name = "json")]
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "snaplink-gateway", version, about = "snaplink URL shortener HTTP gateway")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Public address short URLs are rendered against.
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    #[arg(
        long,
        env = CACHE_BACKEND_ENV,
        value_enum,
        default_value_t = CacheBackendArg::Memory
    )]
    pub cache: CacheBackendArg,

    #[arg(long, env = REDIS_URL_ENV, required_if_eq("cache", "redis"))]
    pub redis_url: Option<String>,

    #[arg(
        long,
        env = CACHE_TTL_SECS_ENV,
        default_value_t = DEFAULT_CACHE_TTL_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub cache_ttl_secs: u64,

    #[arg(long, env = CODE_LENGTH_ENV, default_value_t = DEFAULT_CODE_LENGTH)]
    pub code_length: usize,

    /// Code generation attempts per request before giving up.
    #[arg(
        long,
        env = MAX_ATTEMPTS_ENV,
        default_value_t = DEFAULT_MAX_ATTEMPTS,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub max_attempts: usize,

    /// Accesses that may wait for the metrics updater before being dropped.
    #[arg(long, env = METRICS_QUEUE_ENV, default_value_t = DEFAULT_METRICS_QUEUE)]
    pub metrics_queue: usize,

    #[arg(
        long,
        env = METRICS_CONCURRENCY_ENV,
        default_value_t = DEFAULT_METRICS_CONCURRENCY
    )]
    pub metrics_concurrency: usize,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,

    /// Default filter directives, used when `RUST_LOG` is unset.
    #[arg(long, env = LOG_FILTER_ENV, default_value = DEFAULT_LOG_FILTER)]
    pub log_filter: String,

    /// OTLP/gRPC collector endpoint. Span export is off when unset.
    #[arg(long, env = OTLP_ENDPOINT_ENV)]
    pub otlp_endpoint: Option<String>,
}

impl CLI {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn shortener_config(&self) -> ShortenerConfig {
        ShortenerConfig::builder()
            .max_attempts(self.max_attempts)
            .cache_ttl(self.cache_ttl())
            .build()
    }

    pub fn metrics_config(&self) -> MetricsConfig {
        MetricsConfig::builder()
            .queue_capacity(self.metrics_queue)
            .max_in_flight(self.metrics_concurrency)
            .build()
    }
}
