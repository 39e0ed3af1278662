//! The state engine: validated atomic mutations plus the read path.
//!
//! Every public operation is a single request/response call. Mutations
//! run as one atomic store script, then publish the post-mutation
//! snapshot on the updates channel -- exactly one publication per
//! mutation, including mutations the clamp turned into no-ops, so
//! late-joining or resynchronizing viewers always converge on the
//! current state. Reads bypass publishing entirely.
//!
//! The engine holds no state of its own beyond the store handle; it is
//! cheap to clone and safe to share across request handlers and the
//! ticker.

use magnetron_store::{StoreError, StorePool};
use magnetron_types::{MicrowaveState, Snapshot, COUNTER_STEP, POWER_STEP};

/// Errors that can occur in the state engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The state store is unreachable or a command timed out. The
    /// triggering operation applied no partial state change.
    #[error("state store unavailable: {source}")]
    StoreUnavailable {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },
}

/// Applies validated deltas to the shared state via atomic store
/// operations and publishes every resulting snapshot.
#[derive(Clone)]
pub struct StateEngine {
    pool: StorePool,
}

impl StateEngine {
    /// Create an engine over the given store handle.
    pub const fn new(pool: StorePool) -> Self {
        Self { pool }
    }

    /// Read the current snapshot. Never publishes.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::StoreUnavailable`] if the store cannot be
    /// reached within the command timeout.
    pub async fn get(&self) -> Result<Snapshot, EngineError> {
        let state = self.pool.get_state().await?;
        Ok(state.snapshot())
    }

    /// Increase power by one step, clamped at 100.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::StoreUnavailable`] on store failure.
    pub async fn increase_power(&self) -> Result<Snapshot, EngineError> {
        let state = self.pool.adjust_power(POWER_STEP).await?;
        self.publish(state).await
    }

    /// Decrease power by one step, clamped at 0.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::StoreUnavailable`] on store failure.
    pub async fn decrease_power(&self) -> Result<Snapshot, EngineError> {
        let state = self.pool.adjust_power(-POWER_STEP).await?;
        self.publish(state).await
    }

    /// Increase the counter by one step. No upper bound.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::StoreUnavailable`] on store failure.
    pub async fn increase_counter(&self) -> Result<Snapshot, EngineError> {
        let state = self.pool.adjust_counter(COUNTER_STEP).await?;
        self.publish(state).await
    }

    /// Decrease the counter by one step, clamped at 0.
    ///
    /// A decrease that would take the counter negative clamps silently,
    /// matching the non-rejecting clamp policy used for power.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::StoreUnavailable`] on store failure.
    pub async fn decrease_counter(&self) -> Result<Snapshot, EngineError> {
        let state = self.pool.adjust_counter(-COUNTER_STEP).await?;
        self.publish(state).await
    }

    /// Decrement the counter by one second iff it is positive.
    ///
    /// Publishes the (possibly unchanged) snapshot either way so viewers
    /// that missed an earlier frame resynchronize on the next tick. Used
    /// exclusively by the [`Ticker`](crate::ticker::Ticker).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::StoreUnavailable`] on store failure.
    pub async fn tick_down(&self) -> Result<Snapshot, EngineError> {
        let state = self.pool.tick_down().await?;
        self.publish(state).await
    }

    /// Reset power and counter to zero unconditionally.
    ///
    /// Credential validation happens in the transport layer before this
    /// is reachable; the engine itself performs no authorization.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::StoreUnavailable`] on store failure.
    pub async fn cancel(&self) -> Result<Snapshot, EngineError> {
        let state = self.pool.reset().await?;
        self.publish(state).await
    }

    /// Return the underlying store handle (for the fan-out hub's
    /// subscription and the ticker lease).
    pub const fn pool(&self) -> &StorePool {
        &self.pool
    }

    /// Publish a post-mutation snapshot and hand it back to the caller.
    async fn publish(&self, state: MicrowaveState) -> Result<Snapshot, EngineError> {
        let snapshot = state.snapshot();
        let receivers = self.pool.publish_snapshot(&snapshot).await?;
        tracing::trace!(
            power = snapshot.power,
            counter = snapshot.counter,
            receivers,
            "Published snapshot"
        );
        Ok(snapshot)
    }
}
