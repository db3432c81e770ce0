//! HTTP transport for snaplink.
//!
//! Exposes the shortening service over axum, together with the command
//! line configuration and telemetry setup used by the `snaplink-gateway`
//! binary.

pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;
pub mod telemetry;

pub use app::App;
pub use state::AppState;
