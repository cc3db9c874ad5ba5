//! Value types for edges and per-vertex adjacency records.
//!
//! Everything here is a plain value: `Clone` yields a deep copy, so handing a
//! record to a caller can never alias a policy's internal state.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of relationship an edge records.
///
/// Stored on the wire as an integer (`base = 0`, `resource = 1`, `patch = 2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum EdgeKind {
    /// Plain link between two documents.
    #[default]
    Base,
    /// Document referencing a resource it depends on.
    Resource,
    /// Document patching another document.
    Patch,
}

impl From<EdgeKind> for u8 {
    fn from(kind: EdgeKind) -> Self {
        match kind {
            EdgeKind::Base => 0,
            EdgeKind::Resource => 1,
            EdgeKind::Patch => 2,
        }
    }
}

impl TryFrom<u8> for EdgeKind {
    type Error = UnknownEdgeKind;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(EdgeKind::Base),
            1 => Ok(EdgeKind::Resource),
            2 => Ok(EdgeKind::Patch),
            other => Err(UnknownEdgeKind(other)),
        }
    }
}

/// Integer on the wire that maps to no [`EdgeKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownEdgeKind(pub u8);

impl fmt::Display for UnknownEdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown edge type {}", self.0)
    }
}

impl std::error::Error for UnknownEdgeKind {}

/// Weight and kind carried by one directed edge.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EdgeValue {
    /// Edge weight.
    pub weight: f64,
    /// Relationship kind.
    #[serde(rename = "edgeType")]
    pub kind: EdgeKind,
}

impl EdgeValue {
    /// Creates an edge value.
    #[must_use]
    pub fn new(weight: f64, kind: EdgeKind) -> Self {
        Self { weight, kind }
    }
}

/// Adjacency record of a single vertex.
///
/// `in_edges` holds edges terminating at the vertex keyed by their source,
/// `out_edges` holds edges originating at it keyed by their destination.
/// Empty maps are omitted on the wire and a `null` map reads back as empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Edges {
    /// Incoming edges: source id -> value.
    #[serde(
        rename = "inEdges",
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub in_edges: BTreeMap<String, EdgeValue>,
    /// Outgoing edges: destination id -> value.
    #[serde(
        rename = "outEdges",
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub out_edges: BTreeMap<String, EdgeValue>,
}

impl Edges {
    /// Creates an empty adjacency record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the vertex has no incident edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.in_edges.is_empty() && self.out_edges.is_empty()
    }

    /// Returns the in-degree.
    #[must_use]
    pub fn in_degree(&self) -> usize {
        self.in_edges.len()
    }

    /// Returns the out-degree.
    #[must_use]
    pub fn out_degree(&self) -> usize {
        self.out_edges.len()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, EdgeValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let map: Option<BTreeMap<String, EdgeValue>> = Option::deserialize(deserializer)?;
    Ok(map.unwrap_or_default())
}

/// Request to insert (or overwrite) the edge `src -> dst`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertEdge {
    /// Source vertex.
    pub src: String,
    /// Destination vertex.
    pub dst: String,
    /// Weight and kind.
    #[serde(rename = "edgeValue")]
    pub val: EdgeValue,
}

impl InsertEdge {
    /// Creates an insertion request.
    #[must_use]
    pub fn new(src: impl Into<String>, dst: impl Into<String>, val: EdgeValue) -> Self {
        Self {
            src: src.into(),
            dst: dst.into(),
            val,
        }
    }
}

/// Request to remove the edge `src -> dst`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoveEdge {
    /// Source vertex.
    pub src: String,
    /// Destination vertex.
    pub dst: String,
}

impl RemoveEdge {
    /// Creates a removal request.
    #[must_use]
    pub fn new(src: impl Into<String>, dst: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            dst: dst.into(),
        }
    }
}
