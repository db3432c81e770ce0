use crate::error::StorageError;
use crate::link::{Access, NewShortLink, ShortLink};
use crate::shortcode::ShortCode;
use async_trait::async_trait;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A read-only view of the durable store.
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Retrieves the link for a given short code.
    /// Returns `None` if the code does not exist.
    async fn get(&self, code: &ShortCode) -> Result<Option<ShortLink>>;

    /// Checks whether a short code already exists in the store.
    async fn exists(&self, code: &ShortCode) -> Result<bool>;
}

/// The durable store: the authoritative mapping from short code to link.
#[async_trait]
pub trait Repository: ReadRepository {
    /// Inserts a new link under `code` and returns the stored row.
    ///
    /// Returns `Err(Conflict)` if the code already exists. Implementations
    /// must enforce this themselves so that concurrent inserts of the same
    /// code cannot both succeed.
    async fn insert(&self, code: &ShortCode, link: NewShortLink) -> Result<ShortLink>;

    /// Applies one access to the link's metrics as a single atomic
    /// read-modify-write and returns the updated row.
    ///
    /// Concurrent calls for the same code are serialized. Returns `None` if
    /// the code does not exist.
    async fn record_access(&self, code: &ShortCode, access: Access) -> Result<Option<ShortLink>>;
}
