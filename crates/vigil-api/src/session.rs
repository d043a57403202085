// Session lifecycle
//
// Owns the login protocol against the vendor's browser-shaped flow:
// fetch the HTML challenge page, scrape the anti-forgery token and server
// nonce, submit the hashed credentials, and harvest the three session
// cookies. The absence of the step-up cookie after an otherwise
// successful login means the account demands a second factor this client
// cannot provide headlessly.
//
// All state transitions run under one async mutex: concurrent
// `ensure_valid()` calls collapse into a single in-flight login. Two
// parallel logins would race on cookie overwrite and could leave the
// store with a mismatched token pair.

use std::sync::Arc;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::Error;
use crate::executor::{ApiRequest, RequestExecutor};
use crate::token_store::{ACCESS_COOKIE, CSRF_TOKEN, SESSION_COOKIE, STEPUP_COOKIE, TokenStore};

/// Login challenge page (HTML, not JSON).
pub const LOGIN_PAGE_PATH: &str = "/auth/login";
/// Credential submission endpoint.
pub const LOGIN_SUBMIT_PATH: &str = "/auth/login";
/// Cheap authenticated liveness probe.
pub const PROBE_PATH: &str = "/auth/status";
/// Best-effort session teardown.
pub const LOGOUT_PATH: &str = "/auth/logout";

/// Marker expected in a healthy probe body.
pub const PROBE_OK_MARKER: &str = "\"authenticated\":true";

static CSRF_INPUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"name="_csrf"\s+value="([^"]+)""#).expect("valid regex")
});
static NONCE_INPUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"name="nonce"\s+value="([^"]+)""#).expect("valid regex")
});

/// Primary account credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// Observable session validity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Valid,
    Unknown,
    Invalid,
}

/// Point-in-time view of the session tokens. Mutated only by the
/// session manager, never persisted.
#[derive(Debug, Clone)]
pub struct Session {
    pub session_cookie: Option<String>,
    pub access_token: Option<String>,
    pub step_up_token: Option<String>,
    pub csrf_token: Option<String>,
    pub validity: Validity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    LoggedOut,
    Authenticating,
    Authenticated,
    Invalid,
}

/// Drives login, re-authentication, and liveness probing.
pub struct SessionManager {
    executor: Arc<RequestExecutor>,
    tokens: Arc<TokenStore>,
    credentials: Credentials,
    login_timeout: Duration,
    state: Mutex<SessionState>,
}

impl SessionManager {
    pub fn new(
        executor: Arc<RequestExecutor>,
        credentials: Credentials,
        login_timeout: Duration,
    ) -> Self {
        let tokens = Arc::clone(executor.tokens());
        Self {
            executor,
            tokens,
            credentials,
            login_timeout,
            state: Mutex::new(SessionState::LoggedOut),
        }
    }

    /// Guarantee an authenticated session, logging in if needed.
    ///
    /// When already authenticated a cheap probe decides whether the
    /// session still holds; only on probe failure does the full login
    /// sequence run. Callers waiting on the internal lock observe the
    /// outcome of the login that ran, not a second login.
    pub async fn ensure_valid(&self) -> Result<(), Error> {
        let mut state = self.state.lock().await;

        if *state == SessionState::Authenticated && self.probe().await {
            return Ok(());
        }

        *state = SessionState::Authenticating;
        match self.login().await {
            Ok(()) => {
                *state = SessionState::Authenticated;
                Ok(())
            }
            Err(e) => {
                *state = SessionState::LoggedOut;
                Err(e)
            }
        }
    }

    /// Mark the session invalid so the next `ensure_valid` re-authenticates.
    /// Called when a data query surfaces a session rejection.
    pub async fn invalidate(&self) {
        *self.state.lock().await = SessionState::Invalid;
    }

    /// Best-effort logout. Transport failures are logged, not surfaced;
    /// the token store is cleared either way.
    pub async fn logout(&self) {
        let mut state = self.state.lock().await;
        let request = ApiRequest::post(LOGOUT_PATH, json!({}));
        if let Err(e) = self.executor.execute(&request).await {
            debug!(error = %e, "logout request failed (non-fatal)");
        }
        self.tokens.clear();
        *state = SessionState::LoggedOut;
        debug!("logged out");
    }

    /// Snapshot the current session tokens and validity.
    pub async fn session(&self) -> Session {
        let state = self.state.lock().await;
        let validity = match *state {
            SessionState::Authenticated => Validity::Valid,
            SessionState::Authenticating => Validity::Unknown,
            SessionState::LoggedOut | SessionState::Invalid => Validity::Invalid,
        };
        Session {
            session_cookie: self.tokens.get(SESSION_COOKIE),
            access_token: self.tokens.get(ACCESS_COOKIE),
            step_up_token: self.tokens.get(STEPUP_COOKIE),
            csrf_token: self.tokens.get(CSRF_TOKEN),
            validity,
        }
    }

    /// Lightweight authenticated GET, checked for the expected marker.
    /// Any failure means "probe negative", never an error: the caller's
    /// next step is a full login, which surfaces real problems.
    async fn probe(&self) -> bool {
        match self.executor.execute(&ApiRequest::get(PROBE_PATH)).await {
            Ok(response) => {
                response.status.is_success() && response.body.contains(PROBE_OK_MARKER)
            }
            Err(e) => {
                debug!(error = %e, "liveness probe failed");
                false
            }
        }
    }

    /// The full login sequence. Caller holds the state lock.
    async fn login(&self) -> Result<(), Error> {
        debug!(username = %self.credentials.username, "starting login sequence");

        // Stale cookies must not leak into the new session.
        self.tokens.clear();

        let page = self
            .executor
            .execute(&ApiRequest::get(LOGIN_PAGE_PATH).with_timeout(self.login_timeout))
            .await?;
        let (csrf, nonce) = scrape_challenge(&page.body)?;

        let body = json!({
            "username": self.credentials.username,
            "digest": credential_digest(&self.credentials, &nonce),
            "_csrf": csrf.as_str(),
        });
        let submit = ApiRequest::post(LOGIN_SUBMIT_PATH, body).with_timeout(self.login_timeout);
        let response = match self.executor.execute(&submit).await {
            Ok(r) => r,
            // The executor reads any 401 as a dead session; during login
            // it means the credentials themselves were rejected.
            Err(Error::SessionInvalid) => {
                return Err(Error::Authentication {
                    message: "credentials rejected".into(),
                });
            }
            Err(e) => return Err(e),
        };

        if !response.status.is_success() {
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {})", response.status),
            });
        }

        // The executor has already harvested the Set-Cookie headers.
        if self.tokens.get(SESSION_COOKIE).is_none() || self.tokens.get(ACCESS_COOKIE).is_none() {
            return Err(Error::Authentication {
                message: "login response did not establish a session".into(),
            });
        }
        if self.tokens.get(STEPUP_COOKIE).is_none() {
            warn!("no step-up grant issued -- account requires a second factor");
            return Err(Error::MfaRequired);
        }

        // The challenge token doubles as the CSRF header on later calls.
        self.tokens.set(CSRF_TOKEN, csrf);

        debug!("login successful");
        Ok(())
    }
}

/// Scrape the anti-forgery token and server nonce out of the challenge
/// page. The intermediate step is HTML inside an otherwise JSON API;
/// an attribute match is all the structure we get.
fn scrape_challenge(html: &str) -> Result<(String, String), Error> {
    let csrf = CSRF_INPUT
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned())
        .ok_or_else(|| Error::Authentication {
            message: "challenge page carried no anti-forgery token".into(),
        })?;
    let nonce = NONCE_INPUT
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned())
        .ok_or_else(|| Error::Authentication {
            message: "challenge page carried no nonce".into(),
        })?;
    Ok((csrf, nonce))
}

/// `sha256(username:nonce:password)`, hex-encoded. The password never
/// travels in the clear; the nonce binds the digest to this challenge.
fn credential_digest(credentials: &Credentials, nonce: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(credentials.username.as_bytes());
    hasher.update(b":");
    hasher.update(nonce.as_bytes());
    hasher.update(b":");
    hasher.update(credentials.password.expose_secret().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body><form method="post">
        <input type="hidden" name="_csrf" value="tok-123">
        <input type="hidden" name="nonce" value="n-456">
        </form></body></html>"#;

    #[test]
    fn scrape_finds_token_and_nonce() {
        let (csrf, nonce) = scrape_challenge(PAGE).unwrap();
        assert_eq!(csrf, "tok-123");
        assert_eq!(nonce, "n-456");
    }

    #[test]
    fn scrape_rejects_page_without_token() {
        let result = scrape_challenge("<html><body>maintenance</body></html>");
        assert!(matches!(result, Err(Error::Authentication { .. })));
    }

    #[test]
    fn digest_is_stable_and_nonce_bound() {
        let creds = Credentials {
            username: "alice".into(),
            password: SecretString::from("secret".to_owned()),
        };
        let a = credential_digest(&creds, "n1");
        let b = credential_digest(&creds, "n1");
        let c = credential_digest(&creds, "n2");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
