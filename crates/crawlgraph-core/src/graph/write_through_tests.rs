//! Tests for WriteThroughPolicy over an in-process pool.

use std::sync::Arc;

use super::policy::StoragePolicy;
use super::snapshot::SnapshotPolicy;
use super::types::{EdgeKind, EdgeValue, InsertEdge, RemoveEdge};
use super::write_through::{RemovalReport, WriteThroughPolicy};
use crate::error::Error;
use crate::store::{contents_key, MemoryPool, MemoryStore};

fn policy() -> (MemoryStore, WriteThroughPolicy<MemoryPool>) {
    let store = MemoryStore::new();
    let pool = Arc::new(MemoryPool::new(store.clone()));
    (store, WriteThroughPolicy::new("web", pool))
}

fn resource(src: &str, dst: &str, weight: f64) -> InsertEdge {
    InsertEdge::new(src, dst, EdgeValue::new(weight, EdgeKind::Resource))
}

#[test]
fn test_insert_is_visible_immediately() {
    let (store, mut graph) = policy();
    graph.insert_edges(&[resource("a", "b", 2.5)]).unwrap();

    let b = graph.edges("b").unwrap().unwrap();
    assert_eq!(b.in_edges["a"], EdgeValue::new(2.5, EdgeKind::Resource));
    assert!(store.raw_field(&contents_key("web"), "a").is_some());
    assert_eq!(store.active_connections(), 0);
}

#[test]
fn test_visible_to_other_instances() {
    let (store, mut writer) = policy();
    let reader = WriteThroughPolicy::new("web", Arc::new(MemoryPool::new(store.clone())));

    writer.insert_edges(&[resource("a", "b", 1.0)]).unwrap();
    assert_eq!(reader.edges("a").unwrap().unwrap().out_degree(), 1);

    let snapshot = SnapshotPolicy::open("web", store.connect()).unwrap();
    assert_eq!(snapshot.vertices().unwrap().len(), 2);
}

#[test]
fn test_edges_read_leaves_store_untouched() {
    let (store, mut graph) = policy();
    graph.insert_edges(&[resource("a", "b", 1.0)]).unwrap();
    let before = store.raw_field(&contents_key("web"), "a");

    assert!(graph.edges("missing").unwrap().is_none());
    graph.edges("a").unwrap();

    assert_eq!(store.raw_field(&contents_key("web"), "a"), before);
    assert_eq!(store.field_count(&contents_key("web")), 2);
}

#[test]
fn test_vertices_lists_store_contents() {
    let (store, mut graph) = policy();
    graph.insert_vertices(&["x", "y"]).unwrap();
    store.put_raw(&contents_key("web"), "z", "{}");

    let mut vertices = graph.vertices().unwrap();
    vertices.sort();
    assert_eq!(vertices, vec!["x", "y", "z"]);
}

#[test]
fn test_insert_merges_with_stored_edges() {
    let (_store, mut graph) = policy();
    graph.insert_edges(&[resource("a", "b", 1.0)]).unwrap();
    graph.insert_edges(&[resource("a", "c", 2.0)]).unwrap();

    let a = graph.edges("a").unwrap().unwrap();
    assert_eq!(a.out_degree(), 2);
}

#[test]
fn test_remove_edges() {
    let (_store, mut graph) = policy();
    graph
        .insert_edges(&[resource("a", "b", 1.0), resource("a", "c", 1.0)])
        .unwrap();
    graph.remove_edges(&[RemoveEdge::new("a", "b")]).unwrap();

    let a = graph.edges("a").unwrap().unwrap();
    assert!(!a.out_edges.contains_key("b"));
    assert!(a.out_edges.contains_key("c"));
    assert!(graph.edges("b").unwrap().unwrap().is_empty());
}

#[test]
fn test_insert_vertices_keeps_edges() {
    let (_store, mut graph) = policy();
    graph.insert_edges(&[resource("a", "b", 1.0)]).unwrap();
    graph.insert_vertices(&["a", "fresh"]).unwrap();

    assert_eq!(graph.edges("a").unwrap().unwrap().out_degree(), 1);
    assert!(graph.edges("fresh").unwrap().unwrap().is_empty());
}

#[test]
fn test_remove_vertices_counted_reports_missing() {
    let (store, mut graph) = policy();
    graph.insert_vertices(&["a", "b"]).unwrap();

    let report = graph
        .remove_vertices_counted(&["a", "ghost", "a"])
        .unwrap();
    assert_eq!(
        report,
        RemovalReport {
            requested: 2,
            removed: 1
        }
    );
    assert!(!report.is_complete());
    assert!(store.raw_field(&contents_key("web"), "a").is_none());
    assert!(store.raw_field(&contents_key("web"), "b").is_some());
}

#[test]
fn test_remove_vertices_tolerates_missing() {
    let (_store, mut graph) = policy();
    graph.insert_vertices(&["a"]).unwrap();
    graph.remove_vertices(&["a", "never"]).unwrap();
    assert!(graph.edges("a").unwrap().is_none());
}

#[test]
fn test_empty_inputs_do_not_touch_pool() {
    let (_store, mut graph) = policy();
    graph.shutdown().unwrap();

    graph.insert_edges(&[]).unwrap();
    graph.remove_edges(&[]).unwrap();
    graph.insert_vertices(&[]).unwrap();
    graph.remove_vertices(&[]).unwrap();
}

#[test]
fn test_commit_is_noop() {
    let (_store, mut graph) = policy();
    graph.insert_vertices(&["a"]).unwrap();
    graph.commit().unwrap();
    graph.commit().unwrap();
    assert_eq!(graph.vertices().unwrap(), vec!["a"]);
}

#[test]
fn test_shutdown_closes_shared_pool() {
    let (_store, graph) = policy();
    let mut clone = graph.clone();

    graph.shutdown().unwrap();
    assert!(clone.pool().is_closed());
    assert!(matches!(clone.vertices(), Err(Error::PoolClosed)));
    assert!(matches!(
        clone.insert_vertices(&["a"]),
        Err(Error::PoolClosed)
    ));
}

#[test]
fn test_transport_failure_surfaces() {
    let (store, mut graph) = policy();
    store.set_offline(true);

    let err = graph.insert_edges(&[resource("a", "b", 1.0)]).unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert!(matches!(graph.edges("a"), Err(Error::Transport(_))));
    assert_eq!(store.active_connections(), 0);

    store.set_offline(false);
    graph.insert_edges(&[resource("a", "b", 1.0)]).unwrap();
}

#[test]
fn test_malformed_record_fails_read() {
    let (store, graph) = policy();
    store.put_raw(&contents_key("web"), "bad", "[1,2]");

    let err = graph.edges("bad").unwrap_err();
    assert!(matches!(err, Error::Serialization { ref vertex, .. } if vertex == "bad"));
    assert_eq!(err.code(), "SERIALIZATION");
}

#[test]
fn test_with_span_uses_given_name() {
    let store = MemoryStore::new();
    let pool = Arc::new(MemoryPool::new(store));
    let graph = WriteThroughPolicy::with_span("crawl", pool, tracing::Span::none());
    assert_eq!(graph.name(), "crawl");
}
