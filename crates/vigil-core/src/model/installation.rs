use std::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Opaque tenant key for one installation (site) under an account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstallationId(String);

impl InstallationId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstallationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for InstallationId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for InstallationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One tenant installation. Created by the directory query at startup,
/// read-only afterward; re-running `initialize()` rebuilds the list.
#[derive(Debug, Clone)]
pub struct Installation {
    pub id: InstallationId,
    pub display_name: String,
    /// Secondary PIN credential for arm/disarm commands, if configured.
    pub pin: Option<SecretString>,
}
