use super::*;
use crate::batch::NodeChange;
use crate::error::RenderError;
use crate::node::NodeDescriptor;
use crate::platform::Task;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Runner that never executes anything; these tests only exercise the table.
struct IdleRunner;

impl TaskRunner for IdleRunner {
    fn post_task(&self, _task: Task) {}
}

struct NullRenderManager;

impl RenderManager for NullRenderManager {
    fn apply_changes(&mut self, _root_id: RootId, _changes: &[NodeChange]) -> Result<(), RenderError> {
        Ok(())
    }
}

#[derive(Default)]
struct CountingFactory {
    created: AtomicUsize,
}

impl DocumentFactory for CountingFactory {
    fn create_runner(&self, _root_id: RootId) -> Result<Arc<dyn TaskRunner>, DomError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(IdleRunner))
    }

    fn create_render_manager(&self, _root_id: RootId) -> Box<dyn RenderManager> {
        Box::new(NullRenderManager)
    }
}

struct FailingFactory;

impl DocumentFactory for FailingFactory {
    fn create_runner(&self, root_id: RootId) -> Result<Arc<dyn TaskRunner>, DomError> {
        Err(DomError::RunnerUnavailable {
            root_id,
            reason: "no threads left".to_owned(),
        })
    }

    fn create_render_manager(&self, _root_id: RootId) -> Box<dyn RenderManager> {
        Box::new(NullRenderManager)
    }
}

#[test]
fn get_dom_manager_is_idempotent_per_root() {
    let factory = Arc::new(CountingFactory::default());
    let registry = DomManagerRegistry::new(factory.clone());
    let first = registry.get_dom_manager(10).expect("document 10");
    let again = registry.get_dom_manager(10).expect("document 10");
    let other = registry.get_dom_manager(20).expect("document 20");

    assert!(Arc::ptr_eq(&first, &again));
    assert!(!Arc::ptr_eq(&first, &other));
    assert_eq!(factory.created.load(Ordering::SeqCst), 2);
    assert_eq!(registry.root_ids(), vec![10, 20]);
}

#[test]
fn destroy_removes_entry_and_invalidates_manager() {
    let registry = DomManagerRegistry::new(Arc::new(CountingFactory::default()));
    let manager = registry.get_dom_manager(10).expect("document 10");

    assert!(registry.destroy(10));
    assert!(!registry.destroy(10));
    assert!(!registry.contains(10));
    assert!(manager.is_destroyed());
    assert_eq!(
        manager.create_dom_nodes(vec![NodeDescriptor::new(1)]),
        Err(DomError::Destroyed { root_id: 10 })
    );
    assert_eq!(manager.begin_batch(), Err(DomError::Destroyed { root_id: 10 }));
}

#[test]
fn root_can_be_recreated_after_destroy() {
    let factory = Arc::new(CountingFactory::default());
    let registry = DomManagerRegistry::new(factory.clone());
    let old = registry.get_dom_manager(10).expect("document 10");
    registry.destroy(10);
    let new = registry.get_dom_manager(10).expect("document 10 again");

    assert!(!Arc::ptr_eq(&old, &new));
    assert!(!new.is_destroyed());
    assert_eq!(factory.created.load(Ordering::SeqCst), 2);
}

#[test]
fn runner_failure_leaves_no_entry() {
    let registry = DomManagerRegistry::new(Arc::new(FailingFactory));
    let err = registry.get_dom_manager(3).unwrap_err();
    assert!(matches!(err, DomError::RunnerUnavailable { root_id: 3, .. }));
    assert!(registry.is_empty());
    assert!(registry.get(3).is_none());
}

#[test]
fn dropping_the_registry_destroys_live_documents() {
    let registry = DomManagerRegistry::new(Arc::new(CountingFactory::default()));
    let manager = registry.get_dom_manager(10).expect("document 10");
    drop(registry);
    assert!(manager.is_destroyed());
}
