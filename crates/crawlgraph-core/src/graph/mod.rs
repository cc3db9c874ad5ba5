//! Graph types, the storage contract and its three policies.
//!
//! | Policy | Reads | Writes | Durability |
//! |---|---|---|---|
//! | [`InMemoryPolicy`] | local map | local map | none |
//! | [`SnapshotPolicy`] | loaded snapshot | buffered, dirty vertices only | one CAS transaction on commit |
//! | [`WriteThroughPolicy`] | per-call snapshot | per-call snapshot | one CAS transaction per call |
//!
//! # Example
//!
//! ```rust
//! use crawlgraph_core::graph::{EdgeKind, EdgeValue, Graph, InsertEdge, WriteThroughPolicy};
//! use crawlgraph_core::store::{MemoryPool, MemoryStore};
//! use std::sync::Arc;
//!
//! let pool = Arc::new(MemoryPool::new(MemoryStore::new()));
//! let mut graph = Graph::new(WriteThroughPolicy::new("web", pool));
//!
//! graph.insert_vertices(&["index.html"]).unwrap();
//! graph
//!     .insert_edges(&[InsertEdge::new(
//!         "index.html",
//!         "style.css",
//!         EdgeValue::new(1.0, EdgeKind::Resource),
//!     )])
//!     .unwrap();
//!
//! let css = graph.edges("style.css").unwrap().unwrap();
//! assert_eq!(css.in_edges["index.html"].kind, EdgeKind::Resource);
//! ```

mod in_memory;
mod policy;
mod snapshot;
mod types;
mod write_through;

#[cfg(test)]
mod in_memory_tests;
#[cfg(test)]
mod write_through_tests;

pub use in_memory::InMemoryPolicy;
pub use policy::{Graph, StoragePolicy};
pub use snapshot::SnapshotPolicy;
pub use types::{EdgeKind, EdgeValue, Edges, InsertEdge, RemoveEdge, UnknownEdgeKind};
pub use write_through::{RemovalReport, WriteThroughPolicy};
