//! Leadership lease for the cluster-wide ticker.
//!
//! Exactly one service instance may apply the per-second countdown, no
//! matter how many instances run behind the load balancer. Leadership is
//! a lease key in the state store: acquired with `SET NX PX`, renewed by
//! a compare-owner script, and expiring on its own if the holder dies so
//! another instance takes over within one TTL.
//!
//! Renewal and release both verify ownership inside the script, so a
//! slow instance whose lease already expired cannot clobber the lease a
//! peer has since acquired.

use std::time::Duration;

use fred::interfaces::LuaInterface;
use fred::prelude::*;
use fred::types::{Expiration, SetOptions};

use crate::error::StoreError;
use crate::pool::StorePool;

/// Key holding the ticker leadership lease.
pub const TICKER_LEASE_KEY: &str = "microwave:ticker:lease";

/// Refresh the lease TTL iff this instance still owns it.
/// `KEYS = [lease]`, `ARGV = [owner, ttl_ms]`.
const RENEW_SCRIPT: &str = r"
if redis.call('GET', KEYS[1]) == ARGV[1] then
  return redis.call('PEXPIRE', KEYS[1], ARGV[2])
end
return 0
";

/// Delete the lease iff this instance still owns it.
/// `KEYS = [lease]`, `ARGV = [owner]`.
const RELEASE_SCRIPT: &str = r"
if redis.call('GET', KEYS[1]) == ARGV[1] then
  return redis.call('DEL', KEYS[1])
end
return 0
";

/// Handle on the ticker leadership lease for one service instance.
#[derive(Clone)]
pub struct TickerLease {
    client: Client,
    owner: String,
    ttl_ms: i64,
}

impl TickerLease {
    /// Create a lease handle owned by `owner` (a per-instance unique
    /// string) with the given time-to-live.
    ///
    /// The TTL should comfortably exceed the tick interval so a healthy
    /// holder never loses the lease between renewals, while a dead
    /// holder fails over within a few seconds.
    pub fn new(pool: &StorePool, owner: String, ttl: Duration) -> Self {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        Self {
            client: pool.client().clone(),
            owner,
            ttl_ms,
        }
    }

    /// Try to take the lease. Returns `true` if this instance is now
    /// the holder, `false` if another live instance holds it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Redis`] if the store call fails.
    pub async fn try_acquire(&self) -> Result<bool, StoreError> {
        let reply: Option<String> = self
            .client
            .set(
                TICKER_LEASE_KEY,
                self.owner.as_str(),
                Some(Expiration::PX(self.ttl_ms)),
                Some(SetOptions::NX),
                false,
            )
            .await?;
        Ok(reply.is_some())
    }

    /// Refresh the lease TTL. Returns `false` if the lease was lost
    /// (expired or taken by a peer) and was not refreshed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Redis`] if the store call fails.
    pub async fn renew(&self) -> Result<bool, StoreError> {
        let refreshed: i64 = self
            .client
            .eval(
                RENEW_SCRIPT,
                vec![TICKER_LEASE_KEY],
                vec![self.owner.clone(), self.ttl_ms.to_string()],
            )
            .await?;
        Ok(refreshed == 1)
    }

    /// Give the lease up on clean shutdown so a peer can take over
    /// immediately instead of waiting out the TTL. A no-op when this
    /// instance is not the holder.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Redis`] if the store call fails.
    pub async fn release(&self) -> Result<(), StoreError> {
        let _: i64 = self
            .client
            .eval(
                RELEASE_SCRIPT,
                vec![TICKER_LEASE_KEY],
                vec![self.owner.clone()],
            )
            .await?;
        Ok(())
    }

    /// The owner string this handle acquires and renews under.
    pub fn owner(&self) -> &str {
        &self.owner
    }
}
