//! Appliance state model and invariant enforcement.
//!
//! The microwave has exactly two stored fields: `power` (a percentage in
//! ten-point steps) and `counter` (remaining run time in seconds). The
//! on/off `status` is derived from those two fields on every read and is
//! never stored independently.
//!
//! # Design Principles
//!
//! - Invariants are enforced by clamping, never by rejecting: a mutation
//!   that would leave the domain is pulled back to the nearest bound.
//! - `power` stays a multiple of [`POWER_STEP`] because every mutation
//!   moves it by a whole step and both bounds are themselves multiples
//!   of the step.
//! - All arithmetic is saturating or checked; the counter can never go
//!   negative and power can never leave `[POWER_MIN, POWER_MAX]`.

use serde::{Deserialize, Serialize};

/// Lowest valid power level (percent).
pub const POWER_MIN: i64 = 0;

/// Highest valid power level (percent).
pub const POWER_MAX: i64 = 100;

/// Size of a single power adjustment (percent).
pub const POWER_STEP: i64 = 10;

/// Size of a single counter adjustment (seconds).
pub const COUNTER_STEP: i64 = 10;

/// Derived on/off status of the appliance.
///
/// `On` iff `power > 0 || counter > 0`. Always recomputed from the
/// stored fields; there is no way to set it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// The appliance is running or primed to run.
    On,
    /// Both power and counter are at zero.
    Off,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::On => write!(f, "On"),
            Self::Off => write!(f, "Off"),
        }
    }
}

/// The authoritative mutable state of the single shared microwave.
///
/// The canonical value lives in the external state store; instances of
/// this struct are transient views decoded from store reads or script
/// results. Constructing one through [`MicrowaveState::from_raw`]
/// re-applies the domain clamps, so even a foreign write to the store
/// cannot surface an out-of-domain value to a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MicrowaveState {
    /// Power level in percent, `[0, 100]`, multiple of 10.
    pub power: i64,
    /// Remaining run time in whole seconds, never negative.
    pub counter: i64,
}

impl MicrowaveState {
    /// The zero state: power off, no remaining time.
    pub const ZERO: Self = Self {
        power: 0,
        counter: 0,
    };

    /// Build a state from raw store values, clamping both fields into
    /// their domains.
    pub fn from_raw(power: i64, counter: i64) -> Self {
        Self {
            power: clamp_power(power),
            counter: counter.max(0),
        }
    }

    /// Derive the on/off status from the stored fields.
    pub const fn status(&self) -> Status {
        if self.power > 0 || self.counter > 0 {
            Status::On
        } else {
            Status::Off
        }
    }

    /// Project this state into the wire [`Snapshot`] record.
    pub const fn snapshot(&self) -> Snapshot {
        Snapshot {
            power: self.power,
            counter: self.counter,
            status: self.status(),
        }
    }

    /// Apply a power delta, clamping the result into `[0, 100]`.
    ///
    /// This is the reference semantics of the store-side power script:
    /// the clamp happens together with the addition, never as a separate
    /// follow-up write.
    pub fn with_power_delta(self, delta: i64) -> Self {
        Self {
            power: clamp_power(self.power.saturating_add(delta)),
            counter: self.counter,
        }
    }

    /// Apply a counter delta, clamping the result at the lower bound 0.
    ///
    /// There is no upper bound on remaining time.
    pub fn with_counter_delta(self, delta: i64) -> Self {
        Self {
            power: self.power,
            counter: self.counter.saturating_add(delta).max(0),
        }
    }

    /// Decrement the counter by one second iff it is positive.
    ///
    /// A tick against a zero counter is a no-op; the returned state is
    /// unchanged.
    pub fn ticked_down(self) -> Self {
        Self {
            power: self.power,
            counter: self.counter.saturating_sub(1).max(0),
        }
    }
}

impl Default for MicrowaveState {
    fn default() -> Self {
        Self::ZERO
    }
}

/// The triple pushed to every viewer and returned by every read.
///
/// Identical in shape for the pull response and the live-update frames,
/// so a client renders both the same way. `status` is always derived at
/// snapshot time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Power level in percent.
    pub power: i64,
    /// Remaining run time in seconds.
    pub counter: i64,
    /// Derived on/off status.
    pub status: Status,
}

/// Clamp a raw power value into `[POWER_MIN, POWER_MAX]`.
fn clamp_power(power: i64) -> i64 {
    power.clamp(POWER_MIN, POWER_MAX)
}
