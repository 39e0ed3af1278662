//! State store layer for the Magnetron microwave service.
//!
//! A Redis-compatible store owns the authoritative appliance state;
//! every service instance holds only a transient view. This crate is
//! the only path to that state and exposes three things:
//!
//! - **Atomic mutations** -- server-side Lua scripts that apply a delta
//!   and its clamp in one invocation, so concurrent mutations from any
//!   number of instances linearize without application-level locks
//! - **Pub/sub** -- one JSON snapshot published per state change, and a
//!   dedicated subscriber connection feeding each instance's fan-out hub
//! - **Ticker lease** -- the `SET NX PX` lease that elects the single
//!   cluster-wide countdown process
//!
//! # Modules
//!
//! - [`pool`] -- connection handle, atomic operations, pub/sub
//! - [`lease`] -- ticker leadership lease
//! - [`error`] -- shared error type

pub mod error;
pub mod lease;
pub mod pool;

// Re-export primary types for convenience.
pub use error::StoreError;
pub use lease::{TickerLease, TICKER_LEASE_KEY};
pub use pool::{StorePool, UpdateStream, COUNTER_KEY, POWER_KEY, UPDATES_CHANNEL};
