use super::*;
use crate::value::props;

fn container() -> DomNode {
    let mut node = DomNode::new(1, "div", "View");
    node.insert_child(10, None);
    node.insert_child(11, None);
    node
}

#[test]
fn insert_child_at_index_splices() {
    let mut node = container();
    let position = node.insert_child(12, Some(1));
    assert_eq!(position, 1);
    assert_eq!(node.children(), &[10, 12, 11]);
}

#[test]
fn insert_child_past_end_appends() {
    let mut node = container();
    let position = node.insert_child(12, Some(99));
    assert_eq!(position, 2);
    assert_eq!(node.children(), &[10, 11, 12]);
}

#[test]
fn insert_child_at_len_appends() {
    let mut node = container();
    assert_eq!(node.insert_child(12, Some(2)), 2);
    assert_eq!(node.children(), &[10, 11, 12]);
}

#[test]
fn remove_child_reports_previous_position() {
    let mut node = container();
    assert_eq!(node.remove_child(11), Some(1));
    assert_eq!(node.remove_child(11), None);
    assert_eq!(node.children(), &[10]);
}

#[test]
fn merge_props_keeps_untouched_keys() {
    let mut node = DomNode::new(1, "div", "View");
    node.merge_props(props([("color", "blue"), ("width", "10")]));
    node.merge_props(props([("color", "red")]));
    assert_eq!(node.prop("color").and_then(DomValue::as_str), Some("red"));
    assert_eq!(node.prop("width").and_then(DomValue::as_str), Some("10"));
}

#[test]
fn descriptor_builder_collects_fields() {
    let descriptor = NodeDescriptor::new(5)
        .parent(2)
        .index(0)
        .tag("span")
        .view("Text")
        .prop("text", "hello");
    let node = DomNode::from_descriptor(descriptor, 2);
    assert_eq!(node.id(), 5);
    assert_eq!(node.parent(), Some(2));
    assert_eq!(node.tag_name(), "span");
    assert_eq!(node.view_name(), "Text");
    assert_eq!(node.prop("text").and_then(DomValue::as_str), Some("hello"));
    assert!(node.layout().is_none());
}
