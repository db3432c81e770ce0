//! Disposable containers for integration tests.
//!
//! Each server owns its container; dropping the server stops it.

pub mod endpoint;
pub mod error;
pub mod mysql;
pub mod redis;

pub use endpoint::Endpoint;
pub use error::{Result, TestInfraError};
