// Session token & cookie store
//
// A passive side-channel populated by response-header inspection after
// every call. Holds no validation logic; the session manager decides what
// the stored values mean. Subsequent requests read from the store to
// decorate outgoing `Cookie` and CSRF headers.

use std::collections::HashMap;
use std::sync::RwLock;

use reqwest::header::{HeaderMap, SET_COOKIE};
use tracing::trace;

/// Cookie carrying the session identifier.
pub const SESSION_COOKIE: &str = "vgsession";
/// Cookie carrying the access grant.
pub const ACCESS_COOKIE: &str = "vgaccess";
/// Cookie carrying the step-up grant. Its absence after login is the
/// MFA-required signal.
pub const STEPUP_COOKIE: &str = "vgstepup";
/// Anti-forgery token scraped from the login challenge page, replayed
/// as a header on mutating requests.
pub const CSRF_TOKEN: &str = "csrf";

/// Passive name/value store for session cookies and tokens.
#[derive(Debug, Default)]
pub struct TokenStore {
    inner: RwLock<HashMap<String, String>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under `name`, replacing any previous one.
    pub fn set(&self, name: &str, value: impl Into<String>) {
        self.inner
            .write()
            .expect("token store lock poisoned")
            .insert(name.to_owned(), value.into());
    }

    /// Look up a stored value.
    pub fn get(&self, name: &str) -> Option<String> {
        self.inner
            .read()
            .expect("token store lock poisoned")
            .get(name)
            .cloned()
    }

    /// Drop every stored value. Called before a fresh login so stale
    /// cookies cannot be mixed with newly issued ones.
    pub fn clear(&self) {
        self.inner
            .write()
            .expect("token store lock poisoned")
            .clear();
    }

    /// Capture cookies from `Set-Cookie` response headers.
    ///
    /// Each header is parsed as `name=value; attributes...`; attributes
    /// are discarded. Unknown cookie names are stored too -- the store is
    /// a dumb mirror of what the server issued.
    pub fn harvest(&self, headers: &HeaderMap) {
        for header in headers.get_all(SET_COOKIE) {
            let Ok(raw) = header.to_str() else { continue };
            let pair = raw.split(';').next().unwrap_or(raw);
            if let Some((name, value)) = pair.split_once('=') {
                trace!(cookie = name.trim(), "harvested cookie");
                self.set(name.trim(), value.trim());
            }
        }
    }

    /// Assemble the `Cookie` request header from the known session
    /// cookies, in issue order. `None` when no session cookie is held.
    pub fn cookie_header(&self) -> Option<String> {
        let guard = self.inner.read().expect("token store lock poisoned");
        let parts: Vec<String> = [SESSION_COOKIE, ACCESS_COOKIE, STEPUP_COOKIE]
            .iter()
            .filter_map(|name| guard.get(*name).map(|v| format!("{name}={v}")))
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("; "))
        }
    }
}
