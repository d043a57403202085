// ── Runtime connection configuration ──
//
// Describes *how* to reach the vendor cloud. Carries credential data and
// connection tuning, never touches disk -- the embedding framework
// constructs a `ClientConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// The two equivalent production API hosts. Either may report the
/// capacity marker, instructing the client to try the other.
pub const DEFAULT_ENDPOINTS: [&str; 2] = [
    "https://m-api01.vigilcloud.com",
    "https://m-api02.vigilcloud.com",
];

/// Configuration for one account-level client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Ordered candidate API hosts.
    pub endpoints: Vec<Url>,
    /// Account username (e-mail).
    pub username: String,
    /// Account password.
    pub password: SecretString,
    /// Optional secondary PIN. May be a comma-separated list aligned
    /// positionally with the installation directory.
    pub pin: Option<SecretString>,
    /// Socket timeout for data queries.
    pub timeout: Duration,
    /// Timeout budget for login-sequence calls.
    pub login_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoints: DEFAULT_ENDPOINTS
                .iter()
                .map(|u| Url::parse(u).expect("default endpoint URL is valid"))
                .collect(),
            username: String::new(),
            password: SecretString::from(String::new()),
            pin: None,
            timeout: Duration::from_secs(10),
            login_timeout: Duration::from_secs(30),
        }
    }
}
