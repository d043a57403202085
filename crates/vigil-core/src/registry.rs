// ── Installation registry ──
//
// Multi-tenant directory: one account sees many installations. Loaded
// once at startup from the directory query; immutable afterward except
// by an explicit re-sync (re-running initialize()).
//
// A single configured PIN string may be a comma-separated list meant to
// align positionally with the installation list. On a count mismatch
// every installation falls back to the first configured PIN -- operator
// error is degraded gracefully, but loudly: the mismatch becomes a
// startup warning instead of silent acceptance.

use std::sync::RwLock;

use secrecy::SecretString;
use tracing::{debug, warn};

use vigil_api::models::WireDirectoryEntry;
use vigil_api::{RequestExecutor, query};

use crate::error::CoreError;
use crate::model::{Installation, InstallationId};

#[derive(Debug, Default)]
pub struct InstallationRegistry {
    inner: RwLock<Vec<Installation>>,
}

impl InstallationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query the tenant directory and rebuild the installation list,
    /// associating secondary PINs. Returns a warning message when the
    /// PIN count did not match the installation count.
    pub async fn load_all(
        &self,
        executor: &RequestExecutor,
        configured_pin: Option<&str>,
    ) -> Result<Option<String>, CoreError> {
        let data = executor.post_graphql(&query::account_installations()).await?;

        let entries: Vec<WireDirectoryEntry> = serde_json::from_value(
            data.get("account")
                .and_then(|a| a.get("installations"))
                .cloned()
                .unwrap_or_else(|| serde_json::Value::Array(Vec::new())),
        )
        .map_err(|e| CoreError::Directory {
            message: e.to_string(),
        })?;

        let mut installations: Vec<Installation> = entries
            .into_iter()
            .map(|entry| Installation {
                id: InstallationId::from(entry.installation_id),
                display_name: entry.display_name,
                pin: None,
            })
            .collect();

        let warning = assign_pins(&mut installations, configured_pin);
        if let Some(ref message) = warning {
            warn!("{message}");
        }
        debug!(count = installations.len(), "installation directory loaded");

        *self.inner.write().expect("registry lock poisoned") = installations;
        Ok(warning)
    }

    /// Every known installation.
    pub fn all(&self) -> Vec<Installation> {
        self.inner.read().expect("registry lock poisoned").clone()
    }

    /// Look up one installation by id.
    pub fn get(&self, id: &InstallationId) -> Option<Installation> {
        self.inner
            .read()
            .expect("registry lock poisoned")
            .iter()
            .find(|i| i.id == *id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().expect("registry lock poisoned").is_empty()
    }
}

/// Align a comma-separated PIN list positionally with the installation
/// list. Count mismatch: everyone gets the first PIN, and the caller is
/// handed a warning to surface.
fn assign_pins(installations: &mut [Installation], configured: Option<&str>) -> Option<String> {
    let configured = configured?.trim();
    if configured.is_empty() {
        return None;
    }

    let pins: Vec<&str> = configured.split(',').map(str::trim).collect();

    if pins.len() == installations.len() {
        for (installation, pin) in installations.iter_mut().zip(&pins) {
            installation.pin = Some(SecretString::from((*pin).to_owned()));
        }
        return None;
    }

    let first = pins.first().copied().unwrap_or_default();
    for installation in installations.iter_mut() {
        installation.pin = Some(SecretString::from(first.to_owned()));
    }
    Some(format!(
        "configured {} PIN(s) for {} installation(s); every installation falls back to the first PIN",
        pins.len(),
        installations.len(),
    ))
}
