//! State engine, countdown ticker, and configuration for the Magnetron
//! microwave service.
//!
//! This crate owns the domain orchestration between the HTTP layer and
//! the state store:
//!
//! - [`engine::StateEngine`] applies validated deltas through the
//!   store's atomic operations and publishes the resulting snapshot
//! - [`ticker::Ticker`] is the lease-elected process that decrements
//!   the counter once per second, cluster-wide
//! - [`config::ServiceConfig`] is the typed YAML configuration with
//!   environment overrides
//!
//! # Modules
//!
//! - [`engine`] -- atomic state mutations and the read path
//! - [`ticker`] -- leader-elected once-per-second countdown loop
//! - [`config`] -- configuration loading and typed config structures

pub mod config;
pub mod engine;
pub mod ticker;

// Re-export primary types for convenience.
pub use config::{ConfigError, ServiceConfig};
pub use engine::{EngineError, StateEngine};
pub use ticker::Ticker;
