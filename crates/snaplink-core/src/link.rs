use crate::shortcode::ShortCode;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A stored short link, as held by the durable store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortLink {
    /// Surrogate identifier assigned by the store on creation.
    pub id: u64,
    /// The original URL that was shortened.
    pub original_url: String,
    /// The unique short code, immutable once assigned.
    pub short_code: ShortCode,
    /// Access metrics, only ever written by the metrics updater.
    #[serde(flatten)]
    pub metrics: LinkMetrics,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Payload for inserting a new link. The store assigns the id and starts
/// the metrics at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct NewShortLink {
    pub original_url: String,
    pub created_at: Timestamp,
}

impl NewShortLink {
    pub fn new(original_url: impl Into<String>) -> Self {
        Self {
            original_url: original_url.into(),
            created_at: Timestamp::now(),
        }
    }

    /// Builds the initial row for this payload.
    pub fn into_link(self, id: u64, short_code: ShortCode) -> ShortLink {
        ShortLink {
            id,
            original_url: self.original_url,
            short_code,
            metrics: LinkMetrics::default(),
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// One observed lookup of a short code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Access {
    /// Time between the start of the lookup and the metrics update.
    pub latency: Duration,
    /// When the update is applied.
    pub at: Timestamp,
}

impl Access {
    pub fn new(latency: Duration, at: Timestamp) -> Self {
        Self { latency, at }
    }
}

/// Click count and running mean of lookup latency for a link.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LinkMetrics {
    pub clicks: u64,
    #[serde(rename = "avg_response_time")]
    pub avg_response_time_secs: f64,
    pub last_accessed_at: Option<Timestamp>,
}

impl LinkMetrics {
    /// Folds one access into the metrics.
    ///
    /// The average is an exact running mean: the new sample is the
    /// `clicks + 1`-th observation. A zero average is treated as "no samples
    /// yet" and is replaced by the new latency.
    pub fn observe(&self, access: &Access) -> LinkMetrics {
        let response_time = access.latency.as_secs_f64();
        let clicks = self.clicks + 1;

        let avg_response_time_secs = if self.avg_response_time_secs == 0.0 {
            response_time
        } else {
            let n = (clicks - 1) as f64;
            (self.avg_response_time_secs * n + response_time) / (n + 1.0)
        };

        LinkMetrics {
            clicks,
            avg_response_time_secs,
            last_accessed_at: Some(access.at),
        }
    }
}

impl ShortLink {
    /// Applies one access to this link, bumping `updated_at`.
    pub fn record_access(&mut self, access: &Access) {
        self.metrics = self.metrics.observe(access);
        self.updated_at = access.at;
    }
}
