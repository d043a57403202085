// ── Entity synchronizer ──
//
// One category of one installation per call: query, normalize, diff
// against the snapshot store, then notify listeners of what actually
// changed. Listeners are never invoked for a structurally identical
// snapshot.

use std::sync::Arc;

use tracing::{debug, trace};

use vigil_api::models::GraphQlRequest;
use vigil_api::{RequestExecutor, query};

use crate::error::CoreError;
use crate::listeners::ListenerRegistry;
use crate::model::{Category, EntityId, EntitySnapshot, Installation};
use crate::normalize;
use crate::store::SnapshotStore;

pub struct EntitySynchronizer {
    executor: Arc<RequestExecutor>,
    store: Arc<SnapshotStore>,
    listeners: Arc<ListenerRegistry>,
}

impl EntitySynchronizer {
    pub fn new(
        executor: Arc<RequestExecutor>,
        store: Arc<SnapshotStore>,
        listeners: Arc<ListenerRegistry>,
    ) -> Self {
        Self {
            executor,
            store,
            listeners,
        }
    }

    /// Pull one category for one installation and apply it.
    ///
    /// Returns the ids of the entities whose snapshot changed (including
    /// side-channel entities lifted into another category). All store
    /// updates land before the first listener fires.
    pub async fn sync_category(
        &self,
        installation: &Installation,
        category: Category,
    ) -> Result<Vec<EntityId>, CoreError> {
        let request = query_for(category, installation.id.as_str());
        let data = self.executor.post_graphql(&request).await?;
        let snapshots = normalize::parse_category(category, installation, &data)?;

        let mut changed_ids = Vec::new();
        let mut to_dispatch: Vec<EntitySnapshot> = Vec::new();
        for snapshot in snapshots {
            if self.store.apply(snapshot.clone()) {
                changed_ids.push(snapshot.entity_id.clone());
                to_dispatch.push(snapshot);
            } else {
                trace!(
                    entity = %snapshot.entity_id,
                    %category,
                    "snapshot unchanged, discarding"
                );
            }
        }

        for snapshot in &to_dispatch {
            self.listeners.dispatch(snapshot);
        }

        debug!(
            installation = %installation.id,
            %category,
            changed = changed_ids.len(),
            "category sync complete"
        );
        Ok(changed_ids)
    }
}

fn query_for(category: Category, installation_id: &str) -> GraphQlRequest {
    match category {
        Category::Alarm => query::arm_state(installation_id),
        Category::SmartLock => query::door_locks(installation_id),
        Category::DoorWindow => query::door_windows(installation_id),
        Category::Climate => query::climates(installation_id),
        Category::SmartPlug => query::smart_plugs(installation_id),
        Category::Broadband => query::broadband(installation_id),
        Category::UserPresence => query::user_presences(installation_id),
        Category::MouseDetection => query::mouse_detections(installation_id),
    }
}
