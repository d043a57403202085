// ── Client facade ──
//
// Full lifecycle for one account: authentication, installation
// directory, per-category synchronization, command dispatch, and
// listener registration. The embedding framework owns scheduling -- it
// calls `refresh()` periodically; the core never spawns timers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::future::join_all;
use secrecy::ExposeSecret;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use vigil_api::{
    ApiRequest, Credentials, EndpointSet, RequestExecutor, SessionManager, TokenStore,
    TransportConfig,
};

use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::listeners::{ListenerHandle, ListenerRegistry};
use crate::model::{Category, EntityId, EntitySnapshot, Installation, InstallationId};
use crate::registry::InstallationRegistry;
use crate::store::SnapshotStore;
use crate::sync::EntitySynchronizer;

/// The main entry point for consumers. Cheaply cloneable.
#[derive(Clone)]
pub struct VigilClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    executor: Arc<RequestExecutor>,
    session: SessionManager,
    registry: InstallationRegistry,
    store: Arc<SnapshotStore>,
    listeners: Arc<ListenerRegistry>,
    synchronizer: EntitySynchronizer,
    /// Non-fatal warnings accumulated during initialize (e.g. PIN count
    /// mismatch). Drained by the caller via `take_warnings`.
    warnings: tokio::sync::Mutex<Vec<String>>,
    initialized: AtomicBool,
    cancel: CancellationToken,
}

impl VigilClient {
    /// Build a client from configuration. Does NOT authenticate -- call
    /// [`initialize()`](Self::initialize) to log in and load the
    /// installation directory.
    pub fn new(config: ClientConfig) -> Result<Self, CoreError> {
        let endpoints = Arc::new(EndpointSet::new(config.endpoints.clone())?);
        let tokens = Arc::new(TokenStore::new());
        let transport = TransportConfig {
            timeout: config.timeout,
            login_timeout: config.login_timeout,
        };
        let cancel = CancellationToken::new();

        let executor = Arc::new(RequestExecutor::new(
            &transport,
            endpoints,
            tokens,
            cancel.clone(),
        )?);
        let session = SessionManager::new(
            Arc::clone(&executor),
            Credentials {
                username: config.username.clone(),
                password: config.password.clone(),
            },
            config.login_timeout,
        );

        let store = Arc::new(SnapshotStore::new());
        let listeners = Arc::new(ListenerRegistry::new());
        let synchronizer = EntitySynchronizer::new(
            Arc::clone(&executor),
            Arc::clone(&store),
            Arc::clone(&listeners),
        );

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                executor,
                session,
                registry: InstallationRegistry::new(),
                store,
                listeners,
                synchronizer,
                warnings: tokio::sync::Mutex::new(Vec::new()),
                initialized: AtomicBool::new(false),
                cancel,
            }),
        })
    }

    /// Log in, load the installation directory, and run a first refresh.
    ///
    /// Re-running re-authenticates and rebuilds the directory (the only
    /// way installations and their PINs are reconciled after startup).
    pub async fn initialize(&self) -> Result<(), CoreError> {
        self.inner.session.ensure_valid().await?;

        let pin = self.inner.config.pin.as_ref().map(ExposeSecret::expose_secret);
        let warning = self
            .inner
            .registry
            .load_all(&self.inner.executor, pin)
            .await?;
        if let Some(message) = warning {
            self.inner.warnings.lock().await.push(message);
        }

        self.inner.initialized.store(true, Ordering::Release);
        info!(
            installations = self.inner.registry.len(),
            "client initialized"
        );

        self.refresh().await
    }

    /// Pull every category of every installation and fan out change
    /// notifications.
    ///
    /// A failure of one category is contained: it is logged and the
    /// remaining categories and installations proceed, leaving previous
    /// snapshots intact (stale-but-available). Session rejection aborts
    /// the cycle and surfaces, after marking the session invalid so the
    /// next cycle re-authenticates.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        if !self.inner.initialized.load(Ordering::Acquire) {
            return Err(CoreError::NotInitialized);
        }

        self.inner.session.ensure_valid().await?;

        for installation in self.inner.registry.all() {
            let synchronizer = &self.inner.synchronizer;
            let inst = &installation;
            let results = join_all(Category::ALL.map(|category| async move {
                (category, synchronizer.sync_category(inst, category).await)
            }))
            .await;

            for (category, result) in results {
                match result {
                    Ok(_) => {}
                    Err(e) if e.is_auth_expired() => {
                        warn!(
                            installation = %installation.id,
                            %category,
                            "session rejected mid-refresh"
                        );
                        self.inner.session.invalidate().await;
                        return Err(e);
                    }
                    Err(e) => {
                        // Contained: one bad category must not starve the rest.
                        warn!(
                            installation = %installation.id,
                            %category,
                            error = %e,
                            "category sync failed"
                        );
                    }
                }
            }
        }

        debug!(entities = self.inner.store.len(), "refresh complete");
        Ok(())
    }

    /// POST a command payload to a vendor endpoint path, scoped to one
    /// installation (`/installation/{id}{path}`). Returns the HTTP
    /// status code; command result semantics belong to the caller.
    pub async fn send_command(
        &self,
        path: &str,
        payload: serde_json::Value,
        installation_id: &InstallationId,
    ) -> Result<u16, CoreError> {
        if !self.inner.initialized.load(Ordering::Acquire) {
            return Err(CoreError::NotInitialized);
        }

        self.inner.session.ensure_valid().await?;

        let request = ApiRequest::post(format!("/installation/{installation_id}{path}"), payload);
        match self.inner.executor.execute(&request).await {
            Ok(response) => Ok(response.status.as_u16()),
            Err(e) if e.is_auth_expired() => {
                self.inner.session.invalidate().await;
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    // ── Listeners ────────────────────────────────────────────────

    /// Register an observer for one category's changes.
    pub fn register_listener(
        &self,
        category: Category,
        callback: impl Fn(&EntitySnapshot) + Send + Sync + 'static,
    ) -> ListenerHandle {
        self.inner.listeners.register(category, callback)
    }

    /// Remove a previously registered observer.
    pub fn unregister_listener(&self, handle: ListenerHandle) -> bool {
        self.inner.listeners.unregister(handle)
    }

    // ── Accessors ────────────────────────────────────────────────

    /// Last-known snapshot of one entity, if it has been observed.
    pub fn get_entity(
        &self,
        category: Category,
        entity_id: &EntityId,
    ) -> Option<Arc<EntitySnapshot>> {
        self.inner.store.get(category, entity_id)
    }

    /// Every currently known snapshot.
    pub fn entities(&self) -> Vec<Arc<EntitySnapshot>> {
        self.inner.store.all()
    }

    /// The installation directory as loaded by `initialize()`.
    pub fn installations(&self) -> Vec<Installation> {
        self.inner.registry.all()
    }

    /// Drain warnings accumulated during initialization.
    pub async fn take_warnings(&self) -> Vec<String> {
        std::mem::take(&mut *self.inner.warnings.lock().await)
    }

    /// Tear the session down (best effort) and cancel in-flight work.
    pub async fn shutdown(&self) {
        self.inner.session.logout().await;
        self.inner.cancel.cancel();
        debug!("client shut down");
    }
}
