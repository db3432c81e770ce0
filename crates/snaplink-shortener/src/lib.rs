//! URL shortener service implementation.
//!
//! This crate provides [`ShortenerService`], which allocates unique short
//! codes and serves lookups cache-first, and the background metrics updater
//! ([`MetricsRecorder`] / [`MetricsWorker`]) that folds each lookup into the
//! stored click count and running mean latency. Core types are re-exported
//! from `snaplink_core`.

pub mod metrics;
pub mod service;

pub use metrics::{MetricsConfig, MetricsRecorder, MetricsWorker};
pub use service::{ShortenerConfig, ShortenerService, DEFAULT_MAX_ATTEMPTS};
pub use snaplink_core::{LookupSource, Resolved, Shortener, ShortenerError};
