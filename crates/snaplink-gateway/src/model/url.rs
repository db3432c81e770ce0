use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use snaplink_core::ShortLink;

#[derive(Debug, Deserialize)]
pub struct CreateLinkRequest {
    pub original_url: String,
}

/// A stored link as rendered over HTTP. `avg_response_time` is in seconds.
#[derive(Debug, Serialize, Deserialize)]
pub struct LinkResponse {
    pub id: u64,
    pub short_code: String,
    pub short_url: String,
    pub original_url: String,
    pub clicks: u64,
    pub avg_response_time: f64,
    pub last_accessed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl LinkResponse {
    pub fn from_link(link: ShortLink, base_url: &str) -> Self {
        Self {
            id: link.id,
            short_url: link.short_code.to_url(base_url),
            short_code: link.short_code.to_string(),
            original_url: link.original_url,
            clicks: link.metrics.clicks,
            avg_response_time: link.metrics.avg_response_time_secs,
            last_accessed_at: link.metrics.last_accessed_at,
            created_at: link.created_at,
            updated_at: link.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}
