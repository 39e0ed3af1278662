//! Shared type definitions for the Magnetron microwave service.
//!
//! This crate is the single source of truth for the appliance state model
//! used across the Magnetron workspace. It contains no I/O: the state is
//! plain data plus the invariant-enforcing operations on it. The store
//! layer applies the same operations server-side (as atomic scripts); the
//! functions here are the reference semantics and power the property
//! tests.
//!
//! # Modules
//!
//! - [`state`] -- `MicrowaveState`, derived [`Status`], and the wire
//!   [`Snapshot`] record

pub mod state;

// Re-export the public types at crate root for convenience.
pub use state::{MicrowaveState, Snapshot, Status, COUNTER_STEP, POWER_MAX, POWER_MIN, POWER_STEP};
