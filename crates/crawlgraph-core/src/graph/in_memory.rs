//! In-memory storage policy (no store dependencies).
//!
//! A plain adjacency map from vertex id to [`Edges`]. It is used standalone for
//! offline algorithmic work and as the embedded view inside
//! [`SnapshotPolicy`](super::SnapshotPolicy).

use rustc_hash::FxHashMap;

use crate::error::Result;

use super::policy::StoragePolicy;
use super::types::{Edges, InsertEdge, RemoveEdge};

/// In-memory adjacency map with symmetric edge maintenance.
///
/// Every operation is a map mutation and never fails. [`commit`] is a no-op:
/// this policy has no durability.
///
/// [`commit`]: StoragePolicy::commit
#[derive(Debug, Clone, Default)]
pub struct InMemoryPolicy {
    graph: String,
    vertices: FxHashMap<String, Edges>,
}

impl InMemoryPolicy {
    /// Creates an empty graph named `graph`.
    #[must_use]
    pub fn new(graph: impl Into<String>) -> Self {
        Self {
            graph: graph.into(),
            vertices: FxHashMap::default(),
        }
    }

    /// Creates an empty graph with room for `expected_vertices`.
    #[must_use]
    pub fn with_capacity(graph: impl Into<String>, expected_vertices: usize) -> Self {
        Self {
            graph: graph.into(),
            vertices: FxHashMap::with_capacity_and_hasher(expected_vertices, Default::default()),
        }
    }

    /// Returns the number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Returns true if `vertex` is present.
    #[must_use]
    pub fn contains(&self, vertex: &str) -> bool {
        self.vertices.contains_key(vertex)
    }

    /// Returns true when the graph holds no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Borrows the adjacency record of `vertex` without copying it.
    #[must_use]
    pub fn record(&self, vertex: &str) -> Option<&Edges> {
        self.vertices.get(vertex)
    }

    /// Iterates over every `(vertex, record)` pair.
    pub fn records(&self) -> impl Iterator<Item = (&str, &Edges)> {
        self.vertices.iter().map(|(v, e)| (v.as_str(), e))
    }

    /// Installs a record loaded from the store, replacing any previous one.
    pub(crate) fn put_record(&mut self, vertex: String, edges: Edges) {
        self.vertices.insert(vertex, edges);
    }

    fn insert_one(&mut self, edge: &InsertEdge) {
        self.vertices
            .entry(edge.dst.clone())
            .or_default()
            .in_edges
            .insert(edge.src.clone(), edge.val);
        self.vertices
            .entry(edge.src.clone())
            .or_default()
            .out_edges
            .insert(edge.dst.clone(), edge.val);
    }

    // Unknown endpoints are left absent: there is nothing to delete.
    fn remove_one(&mut self, edge: &RemoveEdge) {
        if let Some(dst) = self.vertices.get_mut(&edge.dst) {
            dst.in_edges.remove(&edge.src);
        }
        if let Some(src) = self.vertices.get_mut(&edge.src) {
            src.out_edges.remove(&edge.dst);
        }
    }
}

impl StoragePolicy for InMemoryPolicy {
    fn name(&self) -> &str {
        &self.graph
    }

    fn vertices(&self) -> Result<Vec<String>> {
        Ok(self.vertices.keys().cloned().collect())
    }

    fn edges(&self, vertex: &str) -> Result<Option<Edges>> {
        Ok(self.vertices.get(vertex).cloned())
    }

    fn insert_edges(&mut self, edges: &[InsertEdge]) -> Result<()> {
        for edge in edges {
            self.insert_one(edge);
        }
        Ok(())
    }

    fn remove_edges(&mut self, edges: &[RemoveEdge]) -> Result<()> {
        for edge in edges {
            self.remove_one(edge);
        }
        Ok(())
    }

    fn insert_vertices(&mut self, vertices: &[&str]) -> Result<()> {
        for vertex in vertices {
            self.vertices.entry((*vertex).to_string()).or_default();
        }
        Ok(())
    }

    fn remove_vertices(&mut self, vertices: &[&str]) -> Result<()> {
        for vertex in vertices {
            self.vertices.remove(*vertex);
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        Ok(())
    }
}
