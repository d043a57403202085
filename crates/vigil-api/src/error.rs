use thiserror::Error;

/// Top-level error type for the `vigil-api` crate.
///
/// Covers every failure mode of the wire layer: authentication, transport,
/// capacity signalling, session rejection, and payload decoding.
/// `vigil-core` maps these into refresh outcomes.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed (wrong credentials, account locked, malformed challenge).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The account requires a second authentication factor that this
    /// client cannot complete headlessly. Terminal for the configured
    /// credentials; never retried.
    #[error("Multi-factor authentication required")]
    MfaRequired,

    /// The remote API rejected the session tokens. The session manager
    /// must run a full re-authentication; a raw retry cannot succeed.
    #[error("Session rejected by remote API -- re-authentication required")]
    SessionInvalid,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The caller cancelled the request mid-flight.
    #[error("Request cancelled")]
    Cancelled,

    // ── Capacity ────────────────────────────────────────────────────
    /// Every known endpoint reported the capacity-exceeded marker.
    #[error("All {endpoints} endpoints reported capacity exceeded")]
    Capacity { endpoints: usize },

    // ── Configuration ───────────────────────────────────────────────
    /// Invalid client configuration (e.g. empty endpoint list).
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// Application-level error reported inside a query response.
    #[error("API error: {message}")]
    Api { message: String },

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates the session is no longer
    /// accepted and re-authentication might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::SessionInvalid | Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Capacity { .. } => true,
            _ => false,
        }
    }
}
