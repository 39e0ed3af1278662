//! Leader-elected once-per-second countdown loop.
//!
//! Every service instance runs a ticker task, but only the instance
//! holding the store lease applies the countdown, so exactly one tick
//! reaches the shared counter per second regardless of how many
//! instances are deployed. Leadership fails over automatically: a
//! holder that dies stops renewing and the lease expires within one
//! TTL, after which any peer's next acquisition attempt succeeds.
//!
//! Store failures never crash the loop. A failed renewal, acquisition,
//! or countdown is logged and the tick is skipped; the loop retries on
//! the next interval.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use magnetron_store::TickerLease;

use crate::engine::StateEngine;

/// The autonomous countdown process for one service instance.
pub struct Ticker {
    engine: StateEngine,
    lease: TickerLease,
    interval: Duration,
    is_leader: bool,
}

impl Ticker {
    /// Create a ticker that fires every `interval` (one second in
    /// production; shorter in tests).
    pub const fn new(engine: StateEngine, lease: TickerLease, interval: Duration) -> Self {
        Self {
            engine,
            lease,
            interval,
            is_leader: false,
        }
    }

    /// Run the tick loop until `shutdown` signals or its sender drops.
    ///
    /// On a clean shutdown the lease is released so a peer instance
    /// takes over leadership immediately instead of waiting out the
    /// TTL.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.interval);
        // A stalled store must not cause a burst of catch-up ticks.
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
            owner = self.lease.owner(),
            "Ticker started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.on_tick().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        if self.is_leader {
            match self.lease.release().await {
                Ok(()) => info!("Ticker lease released"),
                Err(e) => warn!(error = %e, "Failed to release ticker lease on shutdown"),
            }
        }
        info!("Ticker stopped");
    }

    /// Apply one tick: confirm leadership, then count down.
    async fn on_tick(&mut self) {
        if !self.ensure_leadership().await {
            return;
        }

        match self.engine.tick_down().await {
            Ok(snapshot) => {
                trace!(counter = snapshot.counter, "Tick applied");
            }
            Err(e) => {
                warn!(error = %e, "Countdown failed, skipping this tick");
            }
        }
    }

    /// Renew the held lease or try to acquire a free one.
    ///
    /// Returns whether this instance leads for the current tick. Store
    /// errors resolve to `false`: a tick is skipped rather than risking
    /// a double countdown alongside a healthier peer.
    async fn ensure_leadership(&mut self) -> bool {
        if self.is_leader {
            match self.lease.renew().await {
                Ok(true) => return true,
                Ok(false) => {
                    info!(owner = self.lease.owner(), "Ticker lease lost");
                    self.is_leader = false;
                }
                Err(e) => {
                    warn!(error = %e, "Lease renewal failed, skipping this tick");
                    self.is_leader = false;
                    return false;
                }
            }
        }

        match self.lease.try_acquire().await {
            Ok(true) => {
                info!(owner = self.lease.owner(), "Ticker lease acquired");
                self.is_leader = true;
                true
            }
            Ok(false) => {
                debug!("Another instance holds the ticker lease");
                false
            }
            Err(e) => {
                warn!(error = %e, "Lease acquisition failed, skipping this tick");
                false
            }
        }
    }
}
