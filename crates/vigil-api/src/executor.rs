// Request execution with bounded retry and endpoint failover
//
// Three failure classes get three recovery strategies and are never
// conflated:
//   - transport failure   -> retry the same host, linear backoff, 3 attempts
//   - capacity marker     -> rotate to the next host, bounded by host count
//   - invalid session     -> surface `Error::SessionInvalid` to the session
//                            manager; a raw retry cannot succeed
//
// The capacity marker arrives inside an HTTP 200 body, not as a 5xx; the
// shard can also answer 421 when it does not own the session.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode, header};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::endpoints::EndpointSet;
use crate::error::Error;
use crate::models::{GraphQlEnvelope, GraphQlRequest};
use crate::query::QUERY_PATH;
use crate::token_store::{CSRF_TOKEN, TokenStore};
use crate::transport::TransportConfig;

/// Vendor marker embedded in a 200 body when the shard is at capacity.
pub const CAPACITY_MARKER: &str = "SYS_CAPACITY";
/// Vendor marker embedded in a 200 body when the session is rejected.
pub const INVALID_SESSION_MARKER: &str = "AUT_EXPIRED";

/// Retry tuning for transport-level failures.
///
/// Backoff is linear in the attempt number, not exponential: the dominant
/// failure mode is shard unavailability, and fast endpoint rotation beats
/// long local waits.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempt ceiling per host.
    pub attempts: u32,
    /// Backoff unit; attempt `n` sleeps `n * base_delay` before retrying.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// One outbound API call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the active endpoint host.
    pub path: String,
    pub body: Option<serde_json::Value>,
    /// Per-request timeout override (login calls use a longer budget).
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
            timeout: None,
        }
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: Some(body),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Transport-level response, body undecoded.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Executes API calls against the active endpoint, decorating them with
/// the stored session cookies and CSRF token.
pub struct RequestExecutor {
    http: reqwest::Client,
    endpoints: Arc<EndpointSet>,
    tokens: Arc<TokenStore>,
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl RequestExecutor {
    pub fn new(
        transport: &TransportConfig,
        endpoints: Arc<EndpointSet>,
        tokens: Arc<TokenStore>,
        cancel: CancellationToken,
    ) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            endpoints,
            tokens,
            policy: RetryPolicy::default(),
            cancel,
        })
    }

    /// Override the default retry policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The endpoint router this executor rotates.
    pub fn endpoints(&self) -> &EndpointSet {
        &self.endpoints
    }

    /// The token store this executor decorates requests from.
    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    /// Execute a call, recovering from transport and capacity failures.
    ///
    /// Capacity rotation is bounded by the number of known endpoints;
    /// when every host reports the marker the call fails with
    /// [`Error::Capacity`] rather than looping.
    pub async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, Error> {
        let mut hosts_tried = 0usize;
        loop {
            let response = self.send_with_retries(request).await?;

            let misdirected = response.status == StatusCode::MISDIRECTED_REQUEST;
            if misdirected || response.body.contains(CAPACITY_MARKER) {
                hosts_tried += 1;
                if hosts_tried >= self.endpoints.len() {
                    return Err(Error::Capacity {
                        endpoints: self.endpoints.len(),
                    });
                }
                warn!(
                    endpoint = %self.endpoints.current(),
                    misdirected,
                    "endpoint at capacity, rotating"
                );
                self.endpoints.rotate();
                continue;
            }

            if response.status == StatusCode::UNAUTHORIZED
                || response.body.contains(INVALID_SESSION_MARKER)
            {
                return Err(Error::SessionInvalid);
            }

            return Ok(response);
        }
    }

    /// POST a query envelope and unwrap `data`.
    pub async fn post_graphql(&self, request: &GraphQlRequest) -> Result<serde_json::Value, Error> {
        let body = serde_json::to_value(request).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: String::new(),
        })?;

        let response = self.execute(&ApiRequest::post(QUERY_PATH, body)).await?;
        if !response.status.is_success() {
            return Err(Error::Api {
                message: format!(
                    "query {} failed (HTTP {})",
                    request.operation_name, response.status
                ),
            });
        }

        let envelope: GraphQlEnvelope =
            serde_json::from_str(&response.body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: response.body.clone(),
            })?;

        if let Some(first) = envelope.errors.first() {
            return Err(Error::Api {
                message: first.message.clone(),
            });
        }

        envelope.data.ok_or_else(|| Error::Deserialization {
            message: "query response carried no data".into(),
            body: response.body,
        })
    }

    /// Retry transport failures against the current host, linear backoff,
    /// up to the policy's attempt ceiling. Cancellation aborts the loop
    /// early instead of completing all configured attempts.
    async fn send_with_retries(&self, request: &ApiRequest) -> Result<ApiResponse, Error> {
        let mut attempt = 0u32;
        loop {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            attempt += 1;

            match self.send_once(request).await {
                Ok(response) => return Ok(response),
                Err(Error::Transport(e)) if attempt < self.policy.attempts => {
                    let delay = self.policy.base_delay * attempt;
                    warn!(
                        attempt,
                        max = self.policy.attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "transport failure, backing off"
                    );
                    tokio::select! {
                        () = self.cancel.cancelled() => return Err(Error::Cancelled),
                        () = tokio::time::sleep(delay) => {}
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(&self, request: &ApiRequest) -> Result<ApiResponse, Error> {
        let url = self.endpoints.current().join(&request.path)?;
        debug!(method = %request.method, %url, "sending request");

        let mut builder = self.http.request(request.method.clone(), url);
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(cookie) = self.tokens.cookie_header() {
            builder = builder.header(header::COOKIE, cookie);
        }
        if let Some(csrf) = self.tokens.get(CSRF_TOKEN) {
            builder = builder.header("X-CSRF-Token", csrf);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(Error::Transport)?;

        // Cookies may be (re)issued on any call; mirror them passively.
        self.tokens.harvest(response.headers());

        let status = response.status();
        let body = response.text().await.map_err(Error::Transport)?;
        Ok(ApiResponse { status, body })
    }
}
