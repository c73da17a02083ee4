use super::*;

fn registry_with(ids: &[NodeId]) -> DomNodeRegistry {
    let mut registry = DomNodeRegistry::new();
    for &id in ids {
        registry
            .add_node(DomNode::new(id, "div", "View"))
            .expect("fresh id");
    }
    registry
}

#[test]
fn add_node_rejects_duplicate_and_keeps_original() {
    let mut registry = registry_with(&[1]);
    let err = registry
        .add_node(DomNode::new(1, "span", "Text"))
        .unwrap_err();
    assert_eq!(err, DomError::DuplicateNode { id: 1 });
    assert_eq!(registry.get_node(1).map(DomNode::tag_name), Some("div"));
    assert_eq!(registry.len(), 1);
}

#[test]
fn get_node_on_missing_id_is_none() {
    let registry = registry_with(&[1, 2]);
    assert!(registry.get_node(3).is_none());
    assert!(registry.contains(2));
}

#[test]
fn remove_node_does_not_cascade() {
    let mut registry = registry_with(&[1, 2]);
    registry
        .get_node_mut(1)
        .expect("node 1")
        .insert_child(2, None);
    let removed = registry.remove_node(1).expect("node 1 removed");
    assert_eq!(removed.children(), &[2]);
    assert!(registry.get_node(1).is_none());
    assert!(registry.get_node(2).is_some());
    assert!(registry.remove_node(1).is_none());
}

#[test]
fn dump_tree_marks_missing_children() {
    let mut registry = registry_with(&[1, 2]);
    let root = registry.get_node_mut(1).expect("root");
    root.insert_child(2, None);
    root.insert_child(3, None);
    assert_eq!(
        registry.dump_tree(Some(1)),
        "[1] div\n  [2] div\n  [3] (missing)\n"
    );
    assert_eq!(registry.dump_tree(None), "(no root)\n");
}
