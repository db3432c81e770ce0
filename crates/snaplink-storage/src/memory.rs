use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use snaplink_core::repository::{ReadRepository, Repository, Result};
use snaplink_core::{Access, NewShortLink, ShortCode, ShortLink, StorageError};
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-local store keyed by short code.
///
/// Inserts go through the dashmap entry API and metric updates hold the
/// shard write guard for the whole read-modify-write, so both are atomic
/// per short code. Ids are assigned from a counter starting at 1.
#[derive(Debug)]
pub struct InMemoryRepository {
    storage: DashMap<String, ShortLink>,
    next_id: AtomicU64,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            storage: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of stored links.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadRepository for InMemoryRepository {
    async fn get(&self, code: &ShortCode) -> Result<Option<ShortLink>> {
        Ok(self
            .storage
            .get(code.as_str())
            .map(|entry| entry.value().clone()))
    }

    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        Ok(self.storage.contains_key(code.as_str()))
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn insert(&self, code: &ShortCode, link: NewShortLink) -> Result<ShortLink> {
        match self.storage.entry(code.as_str().to_owned()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(code.to_string())),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let link = link.into_link(id, code.clone());
                slot.insert(link.clone());
                Ok(link)
            }
        }
    }

    async fn record_access(&self, code: &ShortCode, access: Access) -> Result<Option<ShortLink>> {
        let Some(mut entry) = self.storage.get_mut(code.as_str()) else {
            return Ok(None);
        };

        entry.record_access(&access);
        Ok(Some(entry.value().clone()))
    }
}
