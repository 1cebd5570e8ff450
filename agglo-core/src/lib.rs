//! # agglo-core
//!
//! Core data structures for region agglomeration.
//!
//! This crate provides:
//! - The region adjacency graph (RAG): one node per segmented region, one
//!   edge per pair of regions sharing a boundary
//! - The node join protocol used by agglomeration (edge transfer, size
//!   aggregation, inclusion removal)
//! - Pluggable combine strategies invoked during a join
//! - A lazy merge priority queue (`priority_queue`)
//! - The textual graph file format (`graph_io`)
//!
//! Key invariants:
//! - Region labels are `u32`; label 0 denotes boundary/invalid
//! - No self loops; at most one edge between two live regions
//! - A node's boundary size is at least the sum of its incident edge sizes
//! - Labels of removed regions are never reused within a session

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableUnGraph};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

pub mod graph_io;
pub mod priority_queue;

// ============================================================================
// Type Aliases
// ============================================================================

/// Region identifier. Value 0 denotes boundary/invalid.
pub type Label = u32;

/// Canonical form of an undirected edge key: `(min(u, v), max(u, v))`.
pub fn ordered_pair(u: Label, v: Label) -> (Label, Label) {
    if u <= v {
        (u, v)
    } else {
        (v, u)
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors in RAG construction and mutation
#[derive(Error, Debug)]
pub enum RagError {
    #[error("graph file unparseable: {0}")]
    MalformedInput(String),
    #[error("I/O failure: {0}")]
    IoFailure(#[from] std::io::Error),
    #[error("graph inconsistency: {0}")]
    InvariantViolation(String),
}

/// Result type for RAG operations
pub type RagResult<T> = Result<T, RagError>;

// ============================================================================
// Properties
// ============================================================================

/// A named property value attached to a node or an edge.
///
/// Untagged so that extra keys in the graph file map onto it directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<PropValue>),
}

/// Property map. `BTreeMap` keeps serialization order deterministic.
pub type PropMap = BTreeMap<String, PropValue>;

// ============================================================================
// Nodes and Edges
// ============================================================================

/// A region in the adjacency graph.
#[derive(Debug, Clone, PartialEq)]
pub struct RagNode {
    /// Unique region label, stable while the region is alive
    pub id: Label,
    /// Voxel count of the region
    pub size: u64,
    /// Number of boundary faces between this region and anything else
    pub boundary_size: u64,
    /// Arbitrary named properties
    pub properties: PropMap,
}

impl RagNode {
    /// Create a new region node with no boundary recorded yet
    pub fn new(id: Label, size: u64) -> Self {
        Self {
            id,
            size,
            boundary_size: 0,
            properties: PropMap::new(),
        }
    }
}

/// A shared boundary between two regions.
#[derive(Debug, Clone, PartialEq)]
pub struct RagEdge {
    /// Shared surface area in voxel faces
    pub size: u64,
    /// Current merge cost, typically a classifier probability in [0, 1]
    pub weight: f64,
    /// Do-not-merge marker
    pub preserve: bool,
    /// Synthetic edge that should be ignored by agglomeration
    pub false_edge: bool,
    /// Representative boundary location `(x, y, z)` for review
    pub location: Option<[u32; 3]>,
    /// Back-reference into the merge queue storage; runtime state only,
    /// never serialized
    pub qloc: Option<usize>,
    /// Arbitrary named properties
    pub properties: PropMap,
}

impl RagEdge {
    /// Create a new edge with the given shared surface area
    pub fn new(size: u64) -> Self {
        Self {
            size,
            weight: 0.0,
            preserve: false,
            false_edge: false,
            location: None,
            qloc: None,
            properties: PropMap::new(),
        }
    }

    /// True when agglomeration must skip this edge
    pub fn is_filtered(&self) -> bool {
        self.preserve || self.false_edge
    }
}

// ============================================================================
// Combine Strategies
// ============================================================================

/// Callbacks invoked while two nodes are joined.
///
/// The graph itself aggregates node and edge sizes; a combine strategy folds
/// whatever state lives outside the graph (feature accumulators, queue
/// entries). All methods default to no-ops.
///
/// Callback timing during `Rag::join_nodes(keep, remove, alg)`:
/// - `post_edge_join(existing, removed)`: both edges still present, sizes
///   already aggregated into `existing`; `removed` is deleted right after
/// - `post_edge_move(moved, prior)`: the edge formerly keyed `prior` is now
///   keyed `moved`
/// - `post_node_join(keep, remove)`: all edges transferred, both nodes still
///   present; `remove` is deleted right after
pub trait NodeCombineAlg {
    fn post_edge_join(&mut self, rag: &mut Rag, existing: (Label, Label), removed: (Label, Label)) {
        let _ = (rag, existing, removed);
    }

    fn post_edge_move(&mut self, rag: &mut Rag, moved: (Label, Label), prior: (Label, Label)) {
        let _ = (rag, moved, prior);
    }

    fn post_node_join(&mut self, rag: &mut Rag, keep: Label, remove: Label) {
        let _ = (rag, keep, remove);
    }
}

/// Default strategy: size aggregation only, no external state.
pub struct NullCombine;

impl NodeCombineAlg for NullCombine {}

// ============================================================================
// Rag - Region Adjacency Graph
// ============================================================================

/// Undirected region adjacency graph with a merge protocol.
///
/// Nodes and edges live in a `StableUnGraph` arena so indices survive
/// removals; secondary hash indices give O(1) expected lookup by label and
/// by label pair. Not safe for concurrent mutation.
#[derive(Debug, Default)]
pub struct Rag {
    graph: StableUnGraph<RagNode, RagEdge>,
    node_index: HashMap<Label, NodeIndex>,
    edge_index: HashMap<(Label, Label), EdgeIndex>,
}

impl Rag {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live regions
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of live edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// True when a region with this label is alive
    pub fn has_node(&self, id: Label) -> bool {
        self.node_index.contains_key(&id)
    }

    /// Add a fresh region node. Fails on label 0 or a duplicate label.
    pub fn add_node(&mut self, id: Label, size: u64) -> RagResult<()> {
        self.insert_node(RagNode::new(id, size))
    }

    /// Insert a fully populated node, e.g. when loading a graph file or
    /// restoring a checkpoint.
    pub fn insert_node(&mut self, node: RagNode) -> RagResult<()> {
        if node.id == 0 {
            return Err(RagError::InvariantViolation(
                "label 0 is reserved for boundary".into(),
            ));
        }
        if self.node_index.contains_key(&node.id) {
            return Err(RagError::InvariantViolation(format!(
                "duplicate node {}",
                node.id
            )));
        }
        let id = node.id;
        let ix = self.graph.add_node(node);
        self.node_index.insert(id, ix);
        Ok(())
    }

    /// Add a fresh edge with the given shared surface area.
    /// Fails on self loops, dead endpoints, or a duplicate edge.
    pub fn add_edge(&mut self, u: Label, v: Label, size: u64) -> RagResult<()> {
        self.insert_edge(u, v, RagEdge::new(size))
    }

    /// Insert a fully populated edge between two live regions.
    pub fn insert_edge(&mut self, u: Label, v: Label, edge: RagEdge) -> RagResult<()> {
        if u == v {
            return Err(RagError::InvariantViolation(format!("self loop on {}", u)));
        }
        let key = ordered_pair(u, v);
        if self.edge_index.contains_key(&key) {
            return Err(RagError::InvariantViolation(format!(
                "duplicate edge ({}, {})",
                key.0, key.1
            )));
        }
        let uix = self.index_of(u)?;
        let vix = self.index_of(v)?;
        let eix = self.graph.add_edge(uix, vix, edge);
        self.edge_index.insert(key, eix);
        Ok(())
    }

    /// Look up a region by label
    pub fn node(&self, id: Label) -> Option<&RagNode> {
        self.node_index.get(&id).map(|&ix| &self.graph[ix])
    }

    /// Mutable region lookup
    pub fn node_mut(&mut self, id: Label) -> Option<&mut RagNode> {
        let ix = *self.node_index.get(&id)?;
        Some(&mut self.graph[ix])
    }

    /// Look up the edge between two regions, in either orientation
    pub fn find_edge(&self, u: Label, v: Label) -> Option<&RagEdge> {
        let eix = *self.edge_index.get(&ordered_pair(u, v))?;
        self.graph.edge_weight(eix)
    }

    /// Mutable edge lookup
    pub fn find_edge_mut(&mut self, u: Label, v: Label) -> Option<&mut RagEdge> {
        let eix = *self.edge_index.get(&ordered_pair(u, v))?;
        self.graph.edge_weight_mut(eix)
    }

    /// Remove the edge between two regions, returning its state
    pub fn remove_edge(&mut self, u: Label, v: Label) -> Option<RagEdge> {
        let eix = self.edge_index.remove(&ordered_pair(u, v))?;
        self.graph.remove_edge(eix)
    }

    /// Remove a region that has no incident edges, returning its state
    pub fn remove_isolated_node(&mut self, id: Label) -> RagResult<RagNode> {
        let ix = self.index_of(id)?;
        if self.graph.neighbors(ix).next().is_some() {
            return Err(RagError::InvariantViolation(format!(
                "node {} still has incident edges",
                id
            )));
        }
        self.node_index.remove(&id);
        self.graph
            .remove_node(ix)
            .ok_or_else(|| RagError::InvariantViolation(format!("node {} vanished", id)))
    }

    /// Degree of a region
    pub fn degree(&self, id: Label) -> usize {
        match self.node_index.get(&id) {
            Some(&ix) => self.graph.neighbors(ix).count(),
            None => 0,
        }
    }

    /// Labels of all live regions, ascending
    pub fn node_labels(&self) -> Vec<Label> {
        let mut labels: Vec<Label> = self.node_index.keys().copied().collect();
        labels.sort_unstable();
        labels
    }

    /// Neighbor labels of a region, ascending
    pub fn neighbors(&self, id: Label) -> Vec<Label> {
        let mut out = match self.node_index.get(&id) {
            Some(&ix) => self
                .graph
                .neighbors(ix)
                .map(|nix| self.graph[nix].id)
                .collect(),
            None => Vec::new(),
        };
        out.sort_unstable();
        out
    }

    /// Stable snapshot of all edges as canonical label pairs, ascending.
    ///
    /// Iteration over this snapshot is unaffected by subsequent mutation,
    /// which keeps traversal order reproducible.
    pub fn edge_pairs(&self) -> Vec<(Label, Label)> {
        let mut pairs: Vec<(Label, Label)> = self.edge_index.keys().copied().collect();
        pairs.sort_unstable();
        pairs
    }

    /// Canonical pairs of all edges incident to a region, ascending
    pub fn incident_edges(&self, id: Label) -> Vec<(Label, Label)> {
        let mut pairs: Vec<(Label, Label)> = self
            .neighbors(id)
            .into_iter()
            .map(|n| ordered_pair(id, n))
            .collect();
        pairs.sort_unstable();
        pairs
    }

    /// Sum of all region sizes; conserved by `join_nodes`
    pub fn total_node_size(&self) -> u64 {
        self.node_index
            .values()
            .map(|&ix| self.graph[ix].size)
            .sum()
    }

    /// Merge region `remove` into region `keep`.
    ///
    /// Every edge of `remove` is transferred to `keep`: parallel edges are
    /// collapsed (sizes summed) and the rest are re-endpointed. The direct
    /// edge between the two regions is deleted, `keep` absorbs the size of
    /// `remove`, and the shared boundary becomes interior:
    /// `keep.boundary_size = keep.b + remove.b - 2 * size(keep, remove)`.
    /// `remove` is then deleted and its label is never observed again.
    ///
    /// The combine strategy is invoked as documented on [`NodeCombineAlg`].
    pub fn join_nodes(
        &mut self,
        keep: Label,
        remove: Label,
        alg: &mut dyn NodeCombineAlg,
    ) -> RagResult<()> {
        if keep == remove {
            return Err(RagError::InvariantViolation(format!(
                "cannot join node {} with itself",
                keep
            )));
        }
        self.index_of(keep)?;
        self.index_of(remove)?;

        let direct_size = self.find_edge(keep, remove).map(|e| e.size).unwrap_or(0);

        // Transfer edges in ascending neighbor order for reproducibility.
        for x in self.neighbors(remove) {
            if x == keep {
                continue;
            }
            if self.edge_index.contains_key(&ordered_pair(keep, x)) {
                // Parallel edge: collapse into the surviving edge.
                let incoming = self
                    .find_edge(remove, x)
                    .map(|e| e.size)
                    .unwrap_or_default();
                if let Some(existing) = self.find_edge_mut(keep, x) {
                    existing.size += incoming;
                }
                alg.post_edge_join(self, ordered_pair(keep, x), ordered_pair(remove, x));
                self.remove_edge(remove, x);
            } else {
                // Reattach so the `remove` endpoint becomes `keep`.
                let edge = self.remove_edge(remove, x).ok_or_else(|| {
                    RagError::InvariantViolation(format!("edge ({}, {}) vanished", remove, x))
                })?;
                self.insert_edge(keep, x, edge)?;
                alg.post_edge_move(self, ordered_pair(keep, x), ordered_pair(remove, x));
            }
        }

        self.remove_edge(keep, remove);

        let removed_size;
        let removed_boundary;
        {
            let node = self
                .node(remove)
                .ok_or_else(|| RagError::InvariantViolation(format!("node {} vanished", remove)))?;
            removed_size = node.size;
            removed_boundary = node.boundary_size;
        }
        if let Some(node) = self.node_mut(keep) {
            node.size += removed_size;
            node.boundary_size =
                (node.boundary_size + removed_boundary).saturating_sub(2 * direct_size);
        }

        alg.post_node_join(self, keep, remove);
        self.remove_isolated_node(remove)?;
        Ok(())
    }

    /// Remove inclusions: merge every region of degree 1 into its unique
    /// neighbor (regions fully enclosed by one other region), repeating
    /// until none remain. A two-region component is mutual, not an
    /// inclusion, and is left intact.
    pub fn remove_inclusions(&mut self, alg: &mut dyn NodeCombineAlg) -> RagResult<()> {
        let mut worklist: Vec<Label> = self
            .node_labels()
            .into_iter()
            .filter(|&id| self.degree(id) == 1)
            .collect();

        while let Some(inc) = worklist.pop() {
            if !self.has_node(inc) || self.degree(inc) != 1 {
                continue;
            }
            let neighbor = self.neighbors(inc)[0];
            if self.degree(neighbor) < 2 {
                continue;
            }
            self.join_nodes(neighbor, inc, alg)?;
            if self.degree(neighbor) == 1 {
                worklist.push(neighbor);
            }
        }
        Ok(())
    }

    fn index_of(&self, id: Label) -> RagResult<NodeIndex> {
        self.node_index
            .get(&id)
            .copied()
            .ok_or_else(|| RagError::InvariantViolation(format!("unknown node {}", id)))
    }
}

// ============================================================================
// Tests
// ============================================================================
