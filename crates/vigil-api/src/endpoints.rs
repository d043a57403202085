// Endpoint failover routing
//
// The vendor backend is sharded across equivalent hosts and a client is
// not guaranteed to hit the shard owning its session. When a host reports
// capacity exhaustion the executor rotates to the next candidate instead
// of retrying the same host.

use std::sync::atomic::{AtomicUsize, Ordering};

use url::Url;

use crate::error::Error;

/// Ordered set of candidate API hosts with a rotating cursor.
///
/// The host list is immutable; the cursor is the only mutable field and
/// always points at a valid index (advanced modulo the list length).
#[derive(Debug)]
pub struct EndpointSet {
    hosts: Vec<Url>,
    cursor: AtomicUsize,
}

impl EndpointSet {
    /// Create a set from an ordered host list. At least one host is required.
    pub fn new(hosts: Vec<Url>) -> Result<Self, Error> {
        if hosts.is_empty() {
            return Err(Error::Config {
                message: "endpoint list must not be empty".into(),
            });
        }
        Ok(Self {
            hosts,
            cursor: AtomicUsize::new(0),
        })
    }

    /// The active candidate host.
    pub fn current(&self) -> &Url {
        let idx = self.cursor.load(Ordering::Acquire) % self.hosts.len();
        &self.hosts[idx]
    }

    /// Advance the cursor to the next candidate, wrapping around.
    ///
    /// Always succeeds, even with a single host (rotation is then a no-op).
    pub fn rotate(&self) {
        let n = self.hosts.len();
        let _ = self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| Some((c + 1) % n));
    }

    /// Number of known hosts.
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn set(urls: &[&str]) -> EndpointSet {
        EndpointSet::new(urls.iter().map(|u| Url::parse(u).unwrap()).collect()).unwrap()
    }

    #[test]
    fn empty_host_list_is_rejected() {
        assert!(matches!(
            EndpointSet::new(Vec::new()),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn rotation_is_cyclic() {
        let eps = set(&["https://a.example/", "https://b.example/", "https://c.example/"]);
        let start = eps.current().clone();

        for _ in 0..eps.len() {
            eps.rotate();
        }
        assert_eq!(*eps.current(), start);
    }

    #[test]
    fn rotation_advances_in_order() {
        let eps = set(&["https://a.example/", "https://b.example/"]);
        assert_eq!(eps.current().host_str(), Some("a.example"));
        eps.rotate();
        assert_eq!(eps.current().host_str(), Some("b.example"));
        eps.rotate();
        assert_eq!(eps.current().host_str(), Some("a.example"));
    }

    #[test]
    fn single_host_rotation_is_noop() {
        let eps = set(&["https://only.example/"]);
        eps.rotate();
        eps.rotate();
        assert_eq!(eps.current().host_str(), Some("only.example"));
    }
}
