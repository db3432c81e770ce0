use std::sync::Arc;

use snaplink_core::Shortener;

#[derive(Clone)]
pub struct AppState {
    shortener: Arc<dyn Shortener>,
    base_url: Arc<str>,
}

impl AppState {
    pub fn new(shortener: Arc<dyn Shortener>, public_base_url: impl Into<String>) -> Self {
        let base_url: String = public_base_url.into();
        Self {
            shortener,
            base_url: base_url.trim_end_matches('/').into(),
        }
    }

    pub fn shortener(&self) -> &dyn Shortener {
        self.shortener.as_ref()
    }

    /// Public address short URLs are rendered against, without a trailing
    /// slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
