// Shared transport configuration for building reqwest::Client instances.
//
// The session manager and the request executor share timeout and
// user-agent settings through this module. Login calls get a longer
// budget than data queries because the challenge/response flow spans
// two round trips on the vendor side.

use std::time::Duration;

use crate::error::Error;

/// Transport tuning for the API client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Socket timeout for data queries.
    pub timeout: Duration,
    /// Timeout for login-sequence calls.
    pub login_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            login_timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    ///
    /// Cookies are deliberately NOT handled by the client: session
    /// cookies are harvested into the [`TokenStore`](crate::TokenStore)
    /// and re-applied explicitly, so failover to another endpoint host
    /// carries the session along.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("vigil/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Transport)
    }
}
