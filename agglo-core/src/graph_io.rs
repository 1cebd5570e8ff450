//! Textual graph file format.
//!
//! A JSON document with a `node` list, an `edge` list and an optional
//! `range` pair bounding the edge weights of interest. Extra keys on node
//! and edge objects round-trip through the property maps. Export orders
//! nodes by label and edges by canonical label pair, so saving a graph the
//! crate itself wrote reproduces the file byte for byte.

use crate::{Label, PropMap, Rag, RagEdge, RagError, RagNode, RagResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NodeRecord {
    id: Label,
    size: u64,
    boundary_size: u64,
    #[serde(flatten)]
    properties: PropMap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EdgeRecord {
    node1: Label,
    node2: Label,
    size: u64,
    weight: f64,
    #[serde(default)]
    preserve: bool,
    #[serde(default)]
    false_edge: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<[u32; 3]>,
    #[serde(flatten)]
    properties: PropMap,
}

/// On-disk document shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GraphDocument {
    node: Vec<NodeRecord>,
    edge: Vec<EdgeRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    range: Option<[f64; 2]>,
}

/// Parse a graph document from a JSON string.
///
/// Returns the graph and the optional `range` pair. Duplicate nodes or
/// edges, self loops, and edges naming unknown regions are malformed input.
pub fn rag_from_json(text: &str) -> RagResult<(Rag, Option<[f64; 2]>)> {
    let doc: GraphDocument =
        serde_json::from_str(text).map_err(|e| RagError::MalformedInput(e.to_string()))?;
    build_rag(doc)
}

/// Load a graph document from a file.
pub fn read_graph(path: &Path) -> RagResult<(Rag, Option<[f64; 2]>)> {
    let reader = BufReader::new(File::open(path)?);
    let doc: GraphDocument =
        serde_json::from_reader(reader).map_err(|e| RagError::MalformedInput(e.to_string()))?;
    build_rag(doc)
}

/// Serialize a graph document to a JSON string.
pub fn rag_to_json(rag: &Rag, range: Option<[f64; 2]>) -> RagResult<String> {
    let doc = build_document(rag, range);
    let mut text =
        serde_json::to_string_pretty(&doc).map_err(|e| RagError::MalformedInput(e.to_string()))?;
    text.push('\n');
    Ok(text)
}

/// Write a graph document to a file.
pub fn write_graph(path: &Path, rag: &Rag, range: Option<[f64; 2]>) -> RagResult<()> {
    let text = rag_to_json(rag, range)?;
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(text.as_bytes())?;
    writer.flush()?;
    Ok(())
}

fn build_rag(doc: GraphDocument) -> RagResult<(Rag, Option<[f64; 2]>)> {
    let mut rag = Rag::new();
    for rec in doc.node {
        let mut node = RagNode::new(rec.id, rec.size);
        node.boundary_size = rec.boundary_size;
        node.properties = rec.properties;
        rag.insert_node(node)
            .map_err(|e| RagError::MalformedInput(e.to_string()))?;
    }
    for rec in doc.edge {
        let mut edge = RagEdge::new(rec.size);
        edge.weight = rec.weight;
        edge.preserve = rec.preserve;
        edge.false_edge = rec.false_edge;
        edge.location = rec.location;
        edge.properties = rec.properties;
        rag.insert_edge(rec.node1, rec.node2, edge)
            .map_err(|e| RagError::MalformedInput(e.to_string()))?;
    }
    Ok((rag, doc.range))
}

fn build_document(rag: &Rag, range: Option<[f64; 2]>) -> GraphDocument {
    let node = rag
        .node_labels()
        .into_iter()
        .filter_map(|id| rag.node(id))
        .map(|n| NodeRecord {
            id: n.id,
            size: n.size,
            boundary_size: n.boundary_size,
            properties: n.properties.clone(),
        })
        .collect();

    let edge = rag
        .edge_pairs()
        .into_iter()
        .filter_map(|(u, v)| rag.find_edge(u, v).map(|e| (u, v, e)))
        .map(|(u, v, e)| EdgeRecord {
            node1: u,
            node2: v,
            size: e.size,
            weight: e.weight,
            preserve: e.preserve,
            false_edge: e.false_edge,
            location: e.location,
            properties: e.properties.clone(),
        })
        .collect();

    GraphDocument { node, edge, range }
}
