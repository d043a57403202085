// ── Listener registry ──
//
// Type-indexed observer registration and dispatch. Registration is rare
// relative to dispatch, so a plain RwLock around the table is enough;
// dispatch clones the callback list and invokes outside the lock so a
// listener may (un)register from inside its own callback.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::model::{Category, EntitySnapshot};

/// Callback invoked once per distinct changed entity.
pub type ListenerCallback = std::sync::Arc<dyn Fn(&EntitySnapshot) + Send + Sync>;

/// Opaque registration handle, returned by `register` and consumed by
/// `unregister`. Callback identity is not comparable in safe Rust, so
/// the handle stands in for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle {
    category: Category,
    token: u64,
}

/// Per-category observer table.
#[derive(Default)]
pub struct ListenerRegistry {
    next_token: AtomicU64,
    table: RwLock<HashMap<Category, Vec<(u64, ListenerCallback)>>>,
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("next_token", &self.next_token)
            .finish_non_exhaustive()
    }
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for one category. Multiple listeners per
    /// category are supported; each sees every change exactly once per
    /// producing sync call.
    pub fn register(
        &self,
        category: Category,
        callback: impl Fn(&EntitySnapshot) + Send + Sync + 'static,
    ) -> ListenerHandle {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        self.table
            .write()
            .expect("listener table lock poisoned")
            .entry(category)
            .or_default()
            .push((token, std::sync::Arc::new(callback)));
        ListenerHandle { category, token }
    }

    /// Remove a registration. Returns `false` when the handle was
    /// already gone.
    pub fn unregister(&self, handle: ListenerHandle) -> bool {
        let mut table = self.table.write().expect("listener table lock poisoned");
        let Some(entries) = table.get_mut(&handle.category) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|(token, _)| *token != handle.token);
        before != entries.len()
    }

    /// Invoke every listener registered for the snapshot's category.
    /// Dispatch order across listeners is unspecified.
    pub fn dispatch(&self, snapshot: &EntitySnapshot) {
        let callbacks: Vec<ListenerCallback> = {
            let table = self.table.read().expect("listener table lock poisoned");
            table.get(&snapshot.category).map_or_else(Vec::new, |entries| {
                entries
                    .iter()
                    .map(|(_, cb)| std::sync::Arc::clone(cb))
                    .collect()
            })
        };
        for callback in callbacks {
            callback(snapshot);
        }
    }

    /// Number of listeners currently registered for a category.
    pub fn count(&self, category: Category) -> usize {
        self.table
            .read()
            .expect("listener table lock poisoned")
            .get(&category)
            .map_or(0, Vec::len)
    }
}
