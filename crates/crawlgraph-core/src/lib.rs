//! # crawlgraph core
//!
//! A weighted directed graph persisted in a remote key-value store.
//!
//! Vertices are opaque string ids (documents, resources discovered by a
//! crawler); edges carry a weight and an [`EdgeKind`](graph::EdgeKind). Each
//! vertex's adjacency record is stored as one JSON field of the hash
//! `graphs:contents:<graph>`.
//!
//! Three interchangeable policies implement the [`StoragePolicy`] contract:
//!
//! - [`InMemoryPolicy`]: local only, for offline algorithms and tests.
//! - [`SnapshotPolicy`]: load once, mutate locally, commit dirty vertices in a
//!   single check-and-set transaction.
//! - [`WriteThroughPolicy`]: one check-and-set transaction per call over a
//!   connection pool.
//!
//! Concurrent writers are never serialized by a lock: a watch on the graph key
//! makes a stale commit fail with [`Error::Conflict`], and the caller retries.
//!
//! ## Quick Start
//!
//! ```rust
//! use crawlgraph_core::{
//!     EdgeKind, EdgeValue, Graph, InsertEdge, MemoryStore, SnapshotPolicy,
//! };
//!
//! fn main() -> crawlgraph_core::Result<()> {
//!     let store = MemoryStore::new();
//!
//!     let mut graph = Graph::new(SnapshotPolicy::open("web", store.connect())?);
//!     graph.insert_vertices(&["A", "B"])?;
//!     graph.insert_edges(&[InsertEdge::new("A", "B", EdgeValue::new(2.5, EdgeKind::Resource))])?;
//!     graph.commit()?;
//!
//!     let fresh = SnapshotPolicy::open("web", store.connect())?;
//!     let a = crawlgraph_core::StoragePolicy::edges(&fresh, "A")?.unwrap_or_default();
//!     assert_eq!(a.out_edges["B"], EdgeValue::new(2.5, EdgeKind::Resource));
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod graph;
pub mod store;

pub use config::{CrawlGraphConfig, LoggingConfig, StoreConfig};
pub use error::{Error, Result};
pub use graph::{
    EdgeKind, EdgeValue, Edges, Graph, InMemoryPolicy, InsertEdge, RemovalReport, RemoveEdge,
    SnapshotPolicy, StoragePolicy, WriteThroughPolicy,
};
#[cfg(feature = "redis")]
pub use store::{RedisConnection, RedisPool};
pub use store::{ConnectionPool, ExecOutcome, MemoryPool, MemoryStore, StoreConnection};
