//! Redis-compatible hot state operations for the shared microwave.
//!
//! The store is the single source of truth for the appliance state. No
//! service instance ever performs a read-modify-write at the application
//! layer: every mutation runs as a server-side Lua script so the
//! increment and its clamp execute atomically, and every script returns
//! the post-mutation `(power, counter)` pair read in the same invocation
//! so the published snapshot is internally consistent.
//!
//! # Key Patterns
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `microwave:power` | Integer | Power level in percent |
//! | `microwave:counter` | Integer | Remaining run time in seconds |
//! | `microwave:updates` | Channel | JSON snapshot per state change |
//! | `microwave:ticker:lease` | String | Ticker leadership lease |
//!
//! Absent keys read as zero, so the zero state exists implicitly from
//! first access and `cancel` never has to delete anything.

use std::time::Duration;

use fred::clients::SubscriberClient;
use fred::interfaces::{EventInterface, LuaInterface, PubsubInterface};
use fred::prelude::*;
use fred::types::Message;
use magnetron_types::{MicrowaveState, Snapshot, POWER_MAX};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::StoreError;

/// Key holding the power level.
pub const POWER_KEY: &str = "microwave:power";

/// Key holding the remaining run time.
pub const COUNTER_KEY: &str = "microwave:counter";

/// Pub/sub channel carrying one JSON [`Snapshot`] per state change.
pub const UPDATES_CHANNEL: &str = "microwave:updates";

/// Adjust the power key by a delta and clamp into `[0, max]`, then read
/// both fields. `KEYS = [power, counter]`, `ARGV = [delta, max]`.
const ADJUST_POWER_SCRIPT: &str = r"
local p = (tonumber(redis.call('GET', KEYS[1])) or 0) + tonumber(ARGV[1])
if p < 0 then p = 0 end
if p > tonumber(ARGV[2]) then p = tonumber(ARGV[2]) end
redis.call('SET', KEYS[1], p)
local c = tonumber(redis.call('GET', KEYS[2])) or 0
return {p, c}
";

/// Adjust the counter key by a delta and clamp at the lower bound 0,
/// then read both fields. `KEYS = [power, counter]`, `ARGV = [delta]`.
const ADJUST_COUNTER_SCRIPT: &str = r"
local c = (tonumber(redis.call('GET', KEYS[2])) or 0) + tonumber(ARGV[1])
if c < 0 then c = 0 end
redis.call('SET', KEYS[2], c)
local p = tonumber(redis.call('GET', KEYS[1])) or 0
return {p, c}
";

/// Decrement the counter by one iff positive, then read both fields.
/// `KEYS = [power, counter]`.
const TICK_DOWN_SCRIPT: &str = r"
local c = tonumber(redis.call('GET', KEYS[2])) or 0
if c > 0 then
  c = c - 1
  redis.call('SET', KEYS[2], c)
end
local p = tonumber(redis.call('GET', KEYS[1])) or 0
return {p, c}
";

/// Reset both fields to zero. `KEYS = [power, counter]`.
const RESET_SCRIPT: &str = r"
redis.call('SET', KEYS[1], 0)
redis.call('SET', KEYS[2], 0)
return {0, 0}
";

/// Connection handle to the Redis-compatible state store.
///
/// Wraps a [`fred::prelude::Client`] and provides the typed atomic
/// operations for the microwave keyspace. Cloning is cheap and shares
/// the underlying connection.
#[derive(Clone)]
pub struct StorePool {
    client: Client,
    config: Config,
}

impl StorePool {
    /// Connect to the state store at the given URL.
    ///
    /// The URL follows the Redis URL scheme: `redis://host:port` or
    /// `redis://:password@host:port/db`. Both the initial connection and
    /// every subsequent command are bounded by `timeout`; a command that
    /// cannot complete within it fails instead of blocking its caller.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if the URL cannot be parsed.
    /// Returns [`StoreError::Redis`] if the connection fails.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let config =
            Config::from_url(url).map_err(|e| StoreError::Config(format!("invalid store URL: {e}")))?;

        let client = Builder::from_config(config.clone())
            .with_connection_config(|cfg| {
                cfg.connection_timeout = timeout;
            })
            .with_performance_config(|cfg| {
                cfg.default_command_timeout = timeout;
            })
            .set_policy(ReconnectPolicy::new_exponential(0, 100, 30_000, 2))
            .build()?;
        client.init().await?;

        tracing::info!("Connected to state store");
        Ok(Self { client, config })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Read the current appliance state.
    ///
    /// Absent keys read as zero. Values written by a foreign client are
    /// clamped back into the domain on decode.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Redis`] if the read fails, or
    /// [`StoreError::Corrupt`] if a stored value is not an integer.
    pub async fn get_state(&self) -> Result<MicrowaveState, StoreError> {
        let values: Vec<Option<String>> = self.client.mget(vec![POWER_KEY, COUNTER_KEY]).await?;
        let power = parse_field(values.first(), POWER_KEY)?;
        let counter = parse_field(values.get(1), COUNTER_KEY)?;
        Ok(MicrowaveState::from_raw(power, counter))
    }

    // =========================================================================
    // Atomic mutations
    // =========================================================================

    /// Atomically add `delta` to the power level, clamped into
    /// `[0, 100]`.
    ///
    /// The clamp executes inside the same script invocation as the
    /// addition, so two concurrent adjustments near a bound cannot both
    /// observe an under-limit value and overshoot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Redis`] if the script fails.
    pub async fn adjust_power(&self, delta: i64) -> Result<MicrowaveState, StoreError> {
        let values: Vec<i64> = self
            .client
            .eval(
                ADJUST_POWER_SCRIPT,
                vec![POWER_KEY, COUNTER_KEY],
                vec![delta, POWER_MAX],
            )
            .await?;
        pair_to_state(&values)
    }

    /// Atomically add `delta` to the counter, clamped at the lower
    /// bound 0. There is no upper bound on remaining time.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Redis`] if the script fails.
    pub async fn adjust_counter(&self, delta: i64) -> Result<MicrowaveState, StoreError> {
        let values: Vec<i64> = self
            .client
            .eval(
                ADJUST_COUNTER_SCRIPT,
                vec![POWER_KEY, COUNTER_KEY],
                vec![delta],
            )
            .await?;
        pair_to_state(&values)
    }

    /// Atomically decrement the counter by one iff it is positive.
    ///
    /// A tick against a zero counter leaves the state unchanged; the
    /// returned state reflects whatever the store holds after the call.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Redis`] if the script fails.
    pub async fn tick_down(&self) -> Result<MicrowaveState, StoreError> {
        let values: Vec<i64> = self
            .client
            .eval(TICK_DOWN_SCRIPT, vec![POWER_KEY, COUNTER_KEY], Vec::<i64>::new())
            .await?;
        pair_to_state(&values)
    }

    /// Atomically reset both fields to zero.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Redis`] if the script fails.
    pub async fn reset(&self) -> Result<MicrowaveState, StoreError> {
        let values: Vec<i64> = self
            .client
            .eval(RESET_SCRIPT, vec![POWER_KEY, COUNTER_KEY], Vec::<i64>::new())
            .await?;
        pair_to_state(&values)
    }

    // =========================================================================
    // Pub/sub
    // =========================================================================

    /// Publish a snapshot on the updates channel.
    ///
    /// Every service instance's fan-out hub receives the publication,
    /// including the instance that performed the mutation. Returns the
    /// number of subscribers that received it (0 is normal when no
    /// instance is listening yet).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if serialization or the publish fails.
    pub async fn publish_snapshot(&self, snapshot: &Snapshot) -> Result<i64, StoreError> {
        let json = serde_json::to_string(snapshot)?;
        let receivers: i64 = self.client.publish(UPDATES_CHANNEL, json.as_str()).await?;
        Ok(receivers)
    }

    /// Open a dedicated subscriber connection on the updates channel.
    ///
    /// The returned stream yields one decoded [`Snapshot`] per
    /// publication. The subscription survives store reconnects; it only
    /// closes when the subscriber client is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Redis`] if the subscriber connection or the
    /// subscribe command fails.
    pub async fn subscribe_updates(&self) -> Result<UpdateStream, StoreError> {
        let subscriber: SubscriberClient = Builder::from_config(self.config.clone())
            .set_policy(ReconnectPolicy::new_exponential(0, 100, 30_000, 2))
            .build_subscriber_client()?;
        subscriber.init().await?;

        // Re-subscribe automatically after a reconnect.
        let _resubscribe_task = subscriber.manage_subscriptions();

        subscriber.subscribe(UPDATES_CHANNEL).await?;
        let rx = subscriber.message_rx();

        debug!(channel = UPDATES_CHANNEL, "Subscribed to state updates");
        Ok(UpdateStream {
            _subscriber: subscriber,
            rx,
        })
    }

    // =========================================================================
    // Test support
    // =========================================================================

    /// Flush all keys from the store instance.
    ///
    /// **WARNING:** This deletes all data. Only use for testing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Redis`] if the flush fails.
    pub async fn flush_all(&self) -> Result<(), StoreError> {
        let _: () = self.client.flushall(false).await?;
        Ok(())
    }

    /// Return a reference to the underlying [`Client`].
    pub const fn client(&self) -> &Client {
        &self.client
    }
}

/// A live subscription to the updates channel.
///
/// Holds the dedicated subscriber connection alive for as long as the
/// stream exists; dropping the stream tears the subscription down.
pub struct UpdateStream {
    _subscriber: SubscriberClient,
    rx: broadcast::Receiver<Message>,
}

impl UpdateStream {
    /// Receive the next published snapshot.
    ///
    /// Frames that cannot be decoded are logged and skipped rather than
    /// terminating the stream; a slow consumer that lags the internal
    /// buffer skips ahead to the newest publication.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SubscriptionClosed`] when the subscriber
    /// connection has shut down and no further snapshots will arrive.
    pub async fn recv(&mut self) -> Result<Snapshot, StoreError> {
        loop {
            match self.rx.recv().await {
                Ok(message) => {
                    let payload: String = match message.value.convert() {
                        Ok(payload) => payload,
                        Err(e) => {
                            warn!("Non-text frame on updates channel: {e}");
                            continue;
                        }
                    };
                    match serde_json::from_str::<Snapshot>(&payload) {
                        Ok(snapshot) => return Ok(snapshot),
                        Err(e) => {
                            warn!("Undecodable snapshot on updates channel: {e}");
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Update subscriber lagged, skipping ahead");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(StoreError::SubscriptionClosed);
                }
            }
        }
    }
}

/// Parse one field of an MGET reply, treating an absent key as zero.
fn parse_field(value: Option<&Option<String>>, key: &str) -> Result<i64, StoreError> {
    match value {
        Some(Some(raw)) => raw.parse::<i64>().map_err(|e| StoreError::Corrupt {
            key: key.to_owned(),
            reason: format!("{e}"),
        }),
        Some(None) => Ok(0),
        None => Err(StoreError::Config(format!(
            "MGET reply missing a value for {key}"
        ))),
    }
}

/// Decode a script's `(power, counter)` reply into a clamped state.
fn pair_to_state(values: &[i64]) -> Result<MicrowaveState, StoreError> {
    let power = values.first().copied().ok_or_else(|| {
        StoreError::Config("script reply missing the power field".to_owned())
    })?;
    let counter = values.get(1).copied().ok_or_else(|| {
        StoreError::Config("script reply missing the counter field".to_owned())
    })?;
    Ok(MicrowaveState::from_raw(power, counter))
}
