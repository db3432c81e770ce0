//! Cache implementations for the short code → URL mirror.

pub mod moka;
pub mod noop;
pub mod redis;

pub use crate::moka::{MokaCacheConfig, MokaUrlCache};
pub use crate::noop::NoopCache;
pub use crate::redis::RedisUrlCache;
pub use snaplink_core::cache::Result;
pub use snaplink_core::{CacheError, UrlCache, DEFAULT_CACHE_TTL};
