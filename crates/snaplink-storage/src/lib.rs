//! Durable store implementations for snaplink.

pub mod memory;
pub mod mysql;

pub use memory::InMemoryRepository;
pub use mysql::MySqlRepository;
pub use snaplink_core::repository::Result;
pub use snaplink_core::{ReadRepository, Repository, StorageError};
