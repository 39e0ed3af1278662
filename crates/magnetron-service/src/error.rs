//! Error types for the service binary.
//!
//! [`ServiceError`] is the top-level error type that wraps all possible
//! failure modes during startup, providing a single error type that
//! `main` can propagate with `?`.

/// Top-level error for the service binary.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: magnetron_core::ConfigError,
    },

    /// The auth secret is missing; the cancel action would be
    /// unverifiable.
    #[error("auth.secret_key is not set (configure it in magnetron.yaml or via APP_SECRET_KEY)")]
    MissingSecret,

    /// The state store connection or subscription failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: magnetron_store::StoreError,
    },

    /// The API server failed to start.
    #[error("server error: {source}")]
    Server {
        /// The underlying startup error.
        #[from]
        source: magnetron_server::startup::StartupError,
    },
}
