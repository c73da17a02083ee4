//! Keyed table of live documents.
//!
//! [`DomManagerRegistry`] guarantees at most one [`DomManager`] per root id.
//! Its lock only covers lookup, creation and removal; batch processing never
//! happens under it. Callers keep the registry explicitly (typically in an
//! `Arc`) and pass root ids end to end.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::collections::map::HashMap;
use crate::config::DocumentConfig;
use crate::error::DomError;
use crate::manager::DomManager;
use crate::node::RootId;
use crate::platform::{LayoutService, RenderManager, TaskRunner};

/// Supplies the per-document collaborators when a root id is first seen.
pub trait DocumentFactory: Send + Sync {
    fn create_runner(&self, root_id: RootId) -> Result<Arc<dyn TaskRunner>, DomError>;

    fn create_render_manager(&self, root_id: RootId) -> Box<dyn RenderManager>;

    fn create_layout_service(&self, root_id: RootId) -> Option<Box<dyn LayoutService>> {
        let _ = root_id;
        None
    }

    fn config(&self, root_id: RootId) -> DocumentConfig {
        let _ = root_id;
        DocumentConfig::default()
    }
}

pub struct DomManagerRegistry {
    factory: Arc<dyn DocumentFactory>,
    managers: Mutex<HashMap<RootId, Arc<DomManager>>>,
}

impl DomManagerRegistry {
    pub fn new(factory: Arc<dyn DocumentFactory>) -> Self {
        Self {
            factory,
            managers: Mutex::new(HashMap::default()),
        }
    }

    /// Returns the manager of `root_id`, creating the document on first use.
    pub fn get_dom_manager(&self, root_id: RootId) -> Result<Arc<DomManager>, DomError> {
        let mut managers = self.lock();
        if let Some(manager) = managers.get(&root_id) {
            return Ok(Arc::clone(manager));
        }
        let runner = self.factory.create_runner(root_id)?;
        let manager = Arc::new(DomManager::new(
            root_id,
            self.factory.config(root_id),
            runner,
            self.factory.create_render_manager(root_id),
            self.factory.create_layout_service(root_id),
        ));
        managers.insert(root_id, Arc::clone(&manager));
        log::debug!("created document {root_id}");
        Ok(manager)
    }

    /// Returns the manager of `root_id` without creating one.
    pub fn get(&self, root_id: RootId) -> Option<Arc<DomManager>> {
        self.lock().get(&root_id).cloned()
    }

    /// Removes `root_id` and schedules its teardown. Returns `false` when no
    /// such document was live.
    pub fn destroy(&self, root_id: RootId) -> bool {
        let removed = self.lock().remove(&root_id);
        match removed {
            Some(manager) => {
                manager.destroy();
                log::debug!("destroyed document {root_id}");
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, root_id: RootId) -> bool {
        self.lock().contains_key(&root_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn root_ids(&self) -> Vec<RootId> {
        let mut ids: Vec<RootId> = self.lock().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RootId, Arc<DomManager>>> {
        self.managers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for DomManagerRegistry {
    fn drop(&mut self) {
        let managers = std::mem::take(&mut *self.lock());
        for manager in managers.into_values() {
            manager.destroy();
        }
    }
}

impl fmt::Debug for DomManagerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomManagerRegistry")
            .field("root_ids", &self.root_ids())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/manager_registry_tests.rs"]
mod tests;
