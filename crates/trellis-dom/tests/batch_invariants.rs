//! Property tests for the batch pipeline.
//!
//! 1. Splitting a batch into single-operation batches yields the same tree
//! 2. Child lists and parent links agree in both directions after any
//!    operation sequence
//! 3. Deleted ids are absent from the registry and every child list
//! 4. The root node survives every batch

use proptest::prelude::*;
use trellis_dom::batch::apply_batch;
use trellis_dom::{BatchOperation, DomNode, DomNodeRegistry, NodeDescriptor, NodeId};

const ROOT: NodeId = 1;

fn fresh_registry() -> DomNodeRegistry {
    let mut registry = DomNodeRegistry::new();
    registry
        .add_node(DomNode::new(ROOT, "root", "RootView"))
        .unwrap();
    registry
}

fn op_strategy() -> impl Strategy<Value = BatchOperation> {
    prop_oneof![
        3 => (2u32..40, prop::option::of(1u32..40), prop::option::of(0usize..8)).prop_map(
            |(id, pid, index)| {
                let mut descriptor = NodeDescriptor::new(id).tag("div");
                descriptor.pid = pid;
                descriptor.index = index;
                BatchOperation::Create(descriptor)
            }
        ),
        1 => (1u32..40, any::<i32>())
            .prop_map(|(id, value)| BatchOperation::Update(NodeDescriptor::new(id).prop("v", value))),
        2 => (1u32..40).prop_map(BatchOperation::Delete),
    ]
}

fn snapshot(registry: &DomNodeRegistry) -> Vec<DomNode> {
    let mut nodes: Vec<DomNode> = registry.iter().cloned().collect();
    nodes.sort_by_key(DomNode::id);
    nodes
}

proptest! {
    #[test]
    fn one_batch_matches_single_operation_batches(
        ops in prop::collection::vec(op_strategy(), 0..60)
    ) {
        let mut whole = fresh_registry();
        let (whole_changes, whole_report) = apply_batch(&mut whole, ROOT, ops.clone());

        let mut split = fresh_registry();
        let mut split_changes = Vec::new();
        let mut applied = 0;
        for op in ops {
            let (changes, report) = apply_batch(&mut split, ROOT, vec![op]);
            applied += report.applied;
            split_changes.extend(changes);
        }

        prop_assert_eq!(snapshot(&whole), snapshot(&split));
        prop_assert_eq!(whole_changes, split_changes);
        prop_assert_eq!(whole_report.applied, applied);
    }

    #[test]
    fn child_lists_agree_with_parent_links(
        ops in prop::collection::vec(op_strategy(), 0..80)
    ) {
        let mut registry = fresh_registry();
        let (_, report) = apply_batch(&mut registry, ROOT, ops.clone());
        prop_assert_eq!(report.applied + report.skipped.len(), ops.len());

        let mut seen = Vec::new();
        for node in registry.iter() {
            for &child in node.children() {
                let child_node = registry.get_node(child);
                prop_assert!(child_node.is_some(), "child {} of {} missing", child, node.id());
                prop_assert_eq!(child_node.and_then(DomNode::parent), Some(node.id()));
                prop_assert!(!seen.contains(&child), "child {} listed twice", child);
                seen.push(child);
            }
        }
        for node in registry.iter() {
            if let Some(pid) = node.parent() {
                let listed = registry
                    .get_node(pid)
                    .map_or(false, |parent| parent.children().contains(&node.id()));
                prop_assert!(listed, "node {} names parent {} which does not list it", node.id(), pid);
            }
        }
        prop_assert!(registry.contains(ROOT));
    }

    #[test]
    fn deleted_nodes_leave_no_trace(
        ops in prop::collection::vec(op_strategy(), 0..60),
        victim in 2u32..40,
    ) {
        let mut registry = fresh_registry();
        apply_batch(&mut registry, ROOT, ops);
        apply_batch(&mut registry, ROOT, vec![BatchOperation::Delete(victim)]);

        prop_assert!(!registry.contains(victim));
        for node in registry.iter() {
            prop_assert!(!node.children().contains(&victim));
        }
    }
}
