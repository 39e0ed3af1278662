//! Error types for the state store layer.
//!
//! All errors are propagated via [`StoreError`] which wraps the
//! underlying [`fred`] errors with additional context about which
//! operation failed. Connection failures and command timeouts both
//! surface as [`StoreError::Redis`]; callers treat any variant as
//! "store unavailable" and never retry on the user's behalf.

/// Errors that can occur in the state store layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A Redis operation failed or timed out.
    #[error("redis error: {0}")]
    Redis(#[from] fred::error::Error),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored value could not be parsed as an integer.
    #[error("corrupt value at {key}: {reason}")]
    Corrupt {
        /// The key holding the unparseable value.
        key: String,
        /// Why the value could not be parsed.
        reason: String,
    },

    /// A configuration error (bad URL, malformed reply shape).
    #[error("configuration error: {0}")]
    Config(String),

    /// The pub/sub subscription channel closed and will deliver no
    /// further snapshots.
    #[error("update subscription closed")]
    SubscriptionClosed,
}
