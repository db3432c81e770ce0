//! Core types and traits for the snaplink URL shortener.
//!
//! This crate provides the domain model shared by the storage, cache,
//! shortener and gateway crates: short codes, stored links with their
//! access metrics, and the collaborator traits the shortening service is
//! composed from.

pub mod cache;
pub mod error;
pub mod link;
pub mod repository;
pub mod shortcode;
pub mod shortener;

pub use cache::{UrlCache, DEFAULT_CACHE_TTL};
pub use error::{CacheError, ShortenerError, StorageError};
pub use link::{Access, LinkMetrics, NewShortLink, ShortLink};
pub use repository::{ReadRepository, Repository};
pub use shortcode::ShortCode;
pub use shortener::{LookupSource, Resolved, Shortener};
