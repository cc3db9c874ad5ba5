//! Write-through policy: one check-and-set transaction per call.
//!
//! Every mutating call borrows a pooled connection, opens a
//! [`SnapshotPolicy`] scoped to the vertices the call touches, applies the
//! change and commits straight away. Independent callers, in this process or
//! others, can therefore share a graph safely; a call that loses a race fails
//! with [`Error::Conflict`](crate::Error::Conflict) and can simply be retried.

use rustc_hash::FxHashSet;
use std::sync::Arc;
use tracing::{debug, warn, Span};

use crate::error::Result;
use crate::store::{self, ConnectionPool};

use super::policy::StoragePolicy;
use super::snapshot::SnapshotPolicy;
use super::types::{Edges, InsertEdge, RemoveEdge};

/// Outcome of a bulk vertex deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovalReport {
    /// Distinct vertex ids requested.
    pub requested: usize,
    /// Fields the store reports as deleted.
    pub removed: usize,
}

impl RemovalReport {
    /// Returns true when every requested vertex existed and was deleted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.requested == self.removed
    }
}

/// Stateless façade committing each call through its own snapshot.
///
/// Cloning is cheap and shares the pool.
#[derive(Debug)]
pub struct WriteThroughPolicy<P: ConnectionPool> {
    graph: String,
    pool: Arc<P>,
    span: Span,
}

impl<P: ConnectionPool> Clone for WriteThroughPolicy<P> {
    fn clone(&self) -> Self {
        Self {
            graph: self.graph.clone(),
            pool: Arc::clone(&self.pool),
            span: self.span.clone(),
        }
    }
}

impl<P: ConnectionPool> WriteThroughPolicy<P> {
    /// Creates a policy for `graph` over `pool`, logging under a
    /// `write_through` span.
    pub fn new(graph: impl Into<String>, pool: Arc<P>) -> Self {
        let graph = graph.into();
        let span = tracing::info_span!("write_through", graph = %graph);
        Self::with_span(graph, pool, span)
    }

    /// Creates a policy whose diagnostics are recorded under `span`.
    pub fn with_span(graph: impl Into<String>, pool: Arc<P>, span: Span) -> Self {
        Self {
            graph: graph.into(),
            pool,
            span,
        }
    }

    /// Returns the shared pool.
    #[must_use]
    pub fn pool(&self) -> &Arc<P> {
        &self.pool
    }

    /// Closes the connection pool. Meant for process shutdown only; every
    /// later call on any clone of this policy fails.
    pub fn shutdown(&self) -> Result<()> {
        let _enter = self.span.enter();
        debug!("shutting down connection pool");
        self.pool.close()
    }

    /// Deletes the vertices' records directly (no check-and-set) and reports
    /// how many of the distinct requested ids actually existed.
    pub fn remove_vertices_counted(&self, vertices: &[&str]) -> Result<RemovalReport> {
        let _enter = self.span.enter();
        let mut conn = self.pool.get()?;
        let removed = store::remove_vertices(&mut conn, &self.graph, vertices)?;

        let requested = vertices.iter().collect::<FxHashSet<_>>().len();
        let report = RemovalReport { requested, removed };
        if !report.is_complete() {
            warn!(
                vertices = ?vertices,
                requested,
                removed,
                "removed fewer vertices than requested"
            );
        }
        Ok(report)
    }

    fn subgraph(&self, vertices: &[&str]) -> Result<SnapshotPolicy<P::Connection>> {
        let conn = self.pool.get()?;
        SnapshotPolicy::open_subgraph(self.graph.clone(), conn, vertices)
    }
}

fn endpoints<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> Vec<&'a str> {
    let mut seen = FxHashSet::default();
    let mut out = Vec::new();
    for (src, dst) in pairs {
        for vertex in [src, dst] {
            if seen.insert(vertex) {
                out.push(vertex);
            }
        }
    }
    out
}

impl<P: ConnectionPool> StoragePolicy for WriteThroughPolicy<P> {
    fn name(&self) -> &str {
        &self.graph
    }

    /// Lists vertices straight from the store; an eventually consistent read.
    fn vertices(&self) -> Result<Vec<String>> {
        let _enter = self.span.enter();
        let mut conn = self.pool.get()?;
        store::read_vertices(&mut conn, &self.graph)
    }

    /// Reads one vertex through a snapshot scoped to it. The snapshot is
    /// released without running a transaction.
    fn edges(&self, vertex: &str) -> Result<Option<Edges>> {
        let _enter = self.span.enter();
        let mut snapshot = self.subgraph(&[vertex])?;
        let edges = snapshot.edges(vertex)?;
        if let Err(err) = snapshot.release() {
            warn!(error = %err, vertex, "failed to release read snapshot");
        }
        Ok(edges)
    }

    fn insert_edges(&mut self, edges: &[InsertEdge]) -> Result<()> {
        if edges.is_empty() {
            return Ok(());
        }
        let _enter = self.span.enter();
        let vertices = endpoints(edges.iter().map(|e| (e.src.as_str(), e.dst.as_str())));
        let mut snapshot = self.subgraph(&vertices)?;
        snapshot.insert_edges(edges)?;
        snapshot.commit()
    }

    fn remove_edges(&mut self, edges: &[RemoveEdge]) -> Result<()> {
        if edges.is_empty() {
            return Ok(());
        }
        let _enter = self.span.enter();
        let vertices = endpoints(edges.iter().map(|e| (e.src.as_str(), e.dst.as_str())));
        let mut snapshot = self.subgraph(&vertices)?;
        snapshot.remove_edges(edges)?;
        snapshot.commit()
    }

    fn insert_vertices(&mut self, vertices: &[&str]) -> Result<()> {
        if vertices.is_empty() {
            return Ok(());
        }
        let _enter = self.span.enter();
        let mut snapshot = self.subgraph(vertices)?;
        snapshot.insert_vertices(vertices)?;
        snapshot.commit()
    }

    /// Bulk delete without check-and-set. Deleting vertices that never
    /// existed is accepted and only logged.
    fn remove_vertices(&mut self, vertices: &[&str]) -> Result<()> {
        if vertices.is_empty() {
            return Ok(());
        }
        self.remove_vertices_counted(vertices).map(drop)
    }

    /// Each call already committed; nothing is buffered. Use
    /// [`shutdown`](WriteThroughPolicy::shutdown) to close the pool.
    fn commit(&mut self) -> Result<()> {
        Ok(())
    }
}
