//! The storage contract shared by every persistence policy, and the
//! [`Graph`] handle that binds one policy to callers.

use crate::error::Result;

use super::types::{Edges, InsertEdge, RemoveEdge};

/// Capability set implemented by every storage policy.
///
/// Graph algorithms depend only on this trait, so they can run against the
/// [`InMemoryPolicy`](super::InMemoryPolicy) without a store, against a
/// [`SnapshotPolicy`](super::SnapshotPolicy) that commits once, or against a
/// [`WriteThroughPolicy`](super::WriteThroughPolicy) that commits per call.
///
/// Reads always return owned values.
pub trait StoragePolicy {
    /// Name of the graph namespace.
    fn name(&self) -> &str;

    /// Lists every vertex id visible to this policy.
    fn vertices(&self) -> Result<Vec<String>>;

    /// Returns the adjacency record of `vertex`, or `None` if it is unknown.
    fn edges(&self, vertex: &str) -> Result<Option<Edges>>;

    /// Inserts (or overwrites) edges, updating both endpoints.
    fn insert_edges(&mut self, edges: &[InsertEdge]) -> Result<()>;

    /// Removes edges from both endpoints.
    fn remove_edges(&mut self, edges: &[RemoveEdge]) -> Result<()>;

    /// Ensures the vertices exist, keeping any edges they already have.
    fn insert_vertices(&mut self, vertices: &[&str]) -> Result<()>;

    /// Deletes the vertices' own adjacency records.
    ///
    /// References held by neighbours are left in place.
    fn remove_vertices(&mut self, vertices: &[&str]) -> Result<()>;

    /// Makes buffered changes durable, if the policy buffers any.
    fn commit(&mut self) -> Result<()>;
}

impl<P: StoragePolicy + ?Sized> StoragePolicy for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn vertices(&self) -> Result<Vec<String>> {
        (**self).vertices()
    }

    fn edges(&self, vertex: &str) -> Result<Option<Edges>> {
        (**self).edges(vertex)
    }

    fn insert_edges(&mut self, edges: &[InsertEdge]) -> Result<()> {
        (**self).insert_edges(edges)
    }

    fn remove_edges(&mut self, edges: &[RemoveEdge]) -> Result<()> {
        (**self).remove_edges(edges)
    }

    fn insert_vertices(&mut self, vertices: &[&str]) -> Result<()> {
        (**self).insert_vertices(vertices)
    }

    fn remove_vertices(&mut self, vertices: &[&str]) -> Result<()> {
        (**self).remove_vertices(vertices)
    }

    fn commit(&mut self) -> Result<()> {
        (**self).commit()
    }
}

/// Handle binding a chosen storage policy to callers.
///
/// # Example
///
/// ```rust
/// use crawlgraph_core::graph::{EdgeKind, EdgeValue, Graph, InMemoryPolicy, InsertEdge};
///
/// let mut graph = Graph::new(InMemoryPolicy::new("web"));
/// graph
///     .insert_edges(&[InsertEdge::new("a", "b", EdgeValue::new(1.0, EdgeKind::Base))])
///     .unwrap();
///
/// let a = graph.edges("a").unwrap().unwrap();
/// assert_eq!(a.out_edges["b"].weight, 1.0);
/// graph.commit().unwrap();
/// ```
#[derive(Debug)]
pub struct Graph<P> {
    policy: P,
}

impl<P: StoragePolicy> Graph<P> {
    /// Binds `policy` to a new handle.
    #[must_use]
    pub fn new(policy: P) -> Self {
        Self { policy }
    }

    /// Returns the underlying policy.
    #[must_use]
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Returns the underlying policy mutably.
    pub fn policy_mut(&mut self) -> &mut P {
        &mut self.policy
    }

    /// Unwraps the handle.
    #[must_use]
    pub fn into_inner(self) -> P {
        self.policy
    }

    /// Name of the graph namespace.
    #[must_use]
    pub fn name(&self) -> &str {
        self.policy.name()
    }

    /// See [`StoragePolicy::vertices`].
    pub fn vertices(&self) -> Result<Vec<String>> {
        self.policy.vertices()
    }

    /// See [`StoragePolicy::edges`].
    pub fn edges(&self, vertex: &str) -> Result<Option<Edges>> {
        self.policy.edges(vertex)
    }

    /// See [`StoragePolicy::insert_edges`].
    pub fn insert_edges(&mut self, edges: &[InsertEdge]) -> Result<()> {
        self.policy.insert_edges(edges)
    }

    /// See [`StoragePolicy::remove_edges`].
    pub fn remove_edges(&mut self, edges: &[RemoveEdge]) -> Result<()> {
        self.policy.remove_edges(edges)
    }

    /// See [`StoragePolicy::insert_vertices`].
    pub fn insert_vertices(&mut self, vertices: &[&str]) -> Result<()> {
        self.policy.insert_vertices(vertices)
    }

    /// See [`StoragePolicy::remove_vertices`].
    pub fn remove_vertices(&mut self, vertices: &[&str]) -> Result<()> {
        self.policy.remove_vertices(vertices)
    }

    /// See [`StoragePolicy::commit`].
    pub fn commit(&mut self) -> Result<()> {
        self.policy.commit()
    }
}
