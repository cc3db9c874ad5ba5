//! Tests for InMemoryPolicy.

use super::in_memory::InMemoryPolicy;
use super::policy::{Graph, StoragePolicy};
use super::types::{EdgeKind, EdgeValue, InsertEdge, RemoveEdge};

fn value(weight: f64) -> EdgeValue {
    EdgeValue::new(weight, EdgeKind::Base)
}

fn build_test_graph() -> InMemoryPolicy {
    let mut graph = InMemoryPolicy::new("test");
    graph
        .insert_edges(&[
            InsertEdge::new("a", "b", value(1.0)),
            InsertEdge::new("a", "c", EdgeValue::new(2.0, EdgeKind::Resource)),
            InsertEdge::new("b", "c", value(3.0)),
        ])
        .unwrap();
    graph
}

#[test]
fn test_name() {
    assert_eq!(InMemoryPolicy::new("web").name(), "web");
}

#[test]
fn test_insert_edge_is_symmetric() {
    let graph = build_test_graph();

    let a = graph.edges("a").unwrap().unwrap();
    let c = graph.edges("c").unwrap().unwrap();

    assert_eq!(a.out_edges["c"], EdgeValue::new(2.0, EdgeKind::Resource));
    assert_eq!(c.in_edges["a"], EdgeValue::new(2.0, EdgeKind::Resource));
    assert!(a.in_edges.is_empty());
    assert!(c.out_edges.is_empty());
}

#[test]
fn test_insert_edge_creates_vertices() {
    let graph = build_test_graph();
    let mut vertices = graph.vertices().unwrap();
    vertices.sort();
    assert_eq!(vertices, vec!["a", "b", "c"]);
    assert_eq!(graph.vertex_count(), 3);
}

#[test]
fn test_reinsert_overwrites_value() {
    let mut graph = build_test_graph();
    graph
        .insert_edges(&[InsertEdge::new("a", "b", EdgeValue::new(9.0, EdgeKind::Patch))])
        .unwrap();

    let a = graph.edges("a").unwrap().unwrap();
    let b = graph.edges("b").unwrap().unwrap();
    assert_eq!(a.out_degree(), 2);
    assert_eq!(a.out_edges["b"], EdgeValue::new(9.0, EdgeKind::Patch));
    assert_eq!(b.in_edges["a"], EdgeValue::new(9.0, EdgeKind::Patch));
}

#[test]
fn test_self_loop() {
    let mut graph = InMemoryPolicy::new("test");
    graph
        .insert_edges(&[InsertEdge::new("x", "x", value(1.0))])
        .unwrap();

    let x = graph.edges("x").unwrap().unwrap();
    assert!(x.in_edges.contains_key("x"));
    assert!(x.out_edges.contains_key("x"));

    graph.remove_edges(&[RemoveEdge::new("x", "x")]).unwrap();
    assert!(graph.edges("x").unwrap().unwrap().is_empty());
}

#[test]
fn test_remove_edge_clears_both_sides() {
    let mut graph = build_test_graph();
    graph.remove_edges(&[RemoveEdge::new("a", "b")]).unwrap();

    let a = graph.edges("a").unwrap().unwrap();
    let b = graph.edges("b").unwrap().unwrap();
    assert!(!a.out_edges.contains_key("b"));
    assert!(!b.in_edges.contains_key("a"));
    // Unrelated edges survive.
    assert!(a.out_edges.contains_key("c"));
    assert!(b.out_edges.contains_key("c"));
}

#[test]
fn test_remove_edge_between_unknown_vertices_is_noop() {
    let mut graph = build_test_graph();
    graph.remove_edges(&[RemoveEdge::new("x", "y")]).unwrap();
    assert!(!graph.contains("x"));
    assert!(!graph.contains("y"));
    assert_eq!(graph.vertex_count(), 3);
}

#[test]
fn test_edges_returns_copy() {
    let graph = build_test_graph();

    let mut a = graph.edges("a").unwrap().unwrap();
    a.out_edges.clear();
    a.in_edges.insert("z".to_string(), value(5.0));

    let again = graph.edges("a").unwrap().unwrap();
    assert_eq!(again.out_degree(), 2);
    assert!(again.in_edges.is_empty());
}

#[test]
fn test_edges_of_unknown_vertex() {
    let graph = build_test_graph();
    assert!(graph.edges("missing").unwrap().is_none());
}

#[test]
fn test_insert_vertices_keeps_existing_edges() {
    let mut graph = build_test_graph();
    graph.insert_vertices(&["a", "lonely"]).unwrap();

    assert_eq!(graph.edges("a").unwrap().unwrap().out_degree(), 2);
    assert!(graph.edges("lonely").unwrap().unwrap().is_empty());
}

#[test]
fn test_remove_vertex_leaves_dangling_references() {
    let mut graph = build_test_graph();
    graph.remove_vertices(&["b"]).unwrap();

    assert!(graph.edges("b").unwrap().is_none());
    // No cascade: neighbours still reference the removed vertex.
    let a = graph.edges("a").unwrap().unwrap();
    assert!(a.out_edges.contains_key("b"));
    let c = graph.edges("c").unwrap().unwrap();
    assert!(c.in_edges.contains_key("b"));
}

#[test]
fn test_commit_is_noop() {
    let mut graph = Graph::new(build_test_graph());
    graph.commit().unwrap();
    assert_eq!(graph.vertices().unwrap().len(), 3);
}

#[test]
fn test_boxed_policy_through_graph() {
    let policy: Box<dyn StoragePolicy> = Box::new(InMemoryPolicy::new("boxed"));
    let mut graph = Graph::new(policy);
    graph
        .insert_edges(&[InsertEdge::new("p", "q", value(1.5))])
        .unwrap();

    assert_eq!(graph.name(), "boxed");
    assert_eq!(graph.edges("q").unwrap().unwrap().in_edges["p"].weight, 1.5);
}

#[test]
fn test_with_capacity() {
    let graph = InMemoryPolicy::with_capacity("test", 128);
    assert!(graph.is_empty());
    assert_eq!(graph.vertex_count(), 0);
}
