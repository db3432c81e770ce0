use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation timed out: {0}")]
    Timeout(String),
    #[error("cache serialization failed: {0}")]
    Serialization(String),
    #[error("cache value is invalid: {0}")]
    InvalidData(String),
    #[error("cache initialization failed: {0}")]
    Initialization(String),
    #[error("cache operation failed: {0}")]
    Operation(String),
}

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// The short code is already taken. The shortener treats this as a
    /// collision and retries with a fresh code.
    #[error("short code already exists: {0}")]
    Conflict(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage migration failed: {0}")]
    Migration(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

/// Errors surfaced by the shortening service.
#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
    #[error("short code not found: {0}")]
    NotFound(String),
    #[error("no free short code found after {attempts} attempts")]
    CodeSpaceExhausted { attempts: usize },
    /// Raised inside the detached metrics worker only. It is logged there and
    /// never returned to a request.
    #[error("metrics update failed: {0}")]
    MetricsUpdate(#[source] StorageError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
