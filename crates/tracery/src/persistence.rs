//! JSON encoding of diagrams.
//!
//! A diagram file looks like this:
//!
//! ```json
//! {
//!   "diagram": "SequenceDiagram",
//!   "version": "0.1.0",
//!   "nodes": [
//!     { "id": 0, "type": "ImplicitParameterNode", "x": 0, "y": 0,
//!       "properties": { "name": "client" }, "children": [1] },
//!     { "id": 1, "type": "CallNode", "x": 0, "y": 0,
//!       "properties": { "openBottom": false } }
//!   ],
//!   "edges": []
//! }
//! ```
//!
//! Nodes are written in pre-order and edges in diagram order. Decoding
//! restores both orders exactly, so a decoded diagram lays out exactly like
//! the one that was saved.

use std::{
    collections::{HashMap, HashSet},
    fs,
    path::Path,
};

use indexmap::IndexMap;
use log::{debug, info};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use thiserror::Error;

use tracery_core::{
    diagram::{Diagram, EdgeKind, ModelError, NodeId, NodeKind, PropertyValue},
    geometry::Point,
};

use crate::error::TraceryError;

/// Value of the `diagram` field.
pub const DIAGRAM_TYPE: &str = "SequenceDiagram";

/// Reasons a diagram file cannot be decoded.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("invalid diagram file: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("expected a SequenceDiagram, found a `{0}`")]
    DiagramType(String),

    #[error("unknown node type `{0}`")]
    UnknownNodeType(String),

    #[error("unknown edge type `{0}`")]
    UnknownEdgeType(String),

    #[error("node id {0} is used more than once")]
    DuplicateId(u32),

    #[error("no node has id {0}")]
    DanglingId(u32),

    #[error("node {0} is listed as the child of more than one node")]
    MultipleParents(u32),

    #[error("node {0} is contained in itself")]
    ContainmentCycle(u32),

    #[error("diagram file describes an invalid diagram: {0}")]
    Model(#[from] ModelError),
}

#[derive(Debug, Deserialize)]
struct DiagramDocument {
    diagram: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    nodes: Vec<NodeRecord>,
    #[serde(default)]
    edges: Vec<EdgeRecord>,
}

#[derive(Debug, Deserialize)]
struct NodeRecord {
    id: u32,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    x: i32,
    #[serde(default)]
    y: i32,
    #[serde(default)]
    properties: IndexMap<String, PropertyValue>,
    #[serde(default)]
    children: Vec<u32>,
}

#[derive(Debug, Deserialize)]
struct EdgeRecord {
    #[serde(rename = "type")]
    kind: String,
    start: u32,
    end: u32,
    #[serde(default)]
    properties: IndexMap<String, PropertyValue>,
}

// =============================================================================
// Encoding
// =============================================================================

/// Encodes `diagram` as a JSON value.
pub fn encode(diagram: &Diagram) -> Value {
    let order = diagram.all_nodes();
    let ids: HashMap<NodeId, u32> = order
        .iter()
        .enumerate()
        .map(|(index, node)| (*node, index as u32))
        .collect();

    let nodes: Vec<Value> = order
        .iter()
        .filter_map(|node| Some((ids.get(node)?, diagram.node(*node).ok()?)))
        .map(|(id, node)| {
            let mut record = json!({
                "id": id,
                "type": node.kind().name(),
                "x": node.position().x(),
                "y": node.position().y(),
                "properties": properties_value(node.properties().iter()),
            });
            let children: Vec<u32> = node
                .children()
                .iter()
                .filter_map(|child| ids.get(child).copied())
                .collect();
            if !children.is_empty() {
                record["children"] = json!(children);
            }
            record
        })
        .collect();

    let edges: Vec<Value> = diagram
        .edges()
        .filter_map(|(_, edge)| {
            Some(json!({
                "type": edge.kind().name(),
                "start": ids.get(&edge.start())?,
                "end": ids.get(&edge.end())?,
                "properties": properties_value(edge.properties().iter()),
            }))
        })
        .collect();

    json!({
        "diagram": DIAGRAM_TYPE,
        "version": env!("CARGO_PKG_VERSION"),
        "nodes": nodes,
        "edges": edges,
    })
}

/// Encodes `diagram` as pretty-printed JSON text.
pub fn to_string(diagram: &Diagram) -> String {
    format!("{:#}", encode(diagram))
}

/// Writes `diagram` to `path`.
pub fn save(diagram: &Diagram, path: impl AsRef<Path>) -> Result<(), TraceryError> {
    let path = path.as_ref();
    fs::write(path, to_string(diagram))?;
    info!(path:? = path, nodes = diagram.node_count(); "Diagram saved");
    Ok(())
}

fn properties_value<'p>(properties: impl Iterator<Item = (&'p str, &'p PropertyValue)>) -> Value {
    let map: Map<String, Value> = properties
        .map(|(key, value)| {
            let value = match value {
                PropertyValue::Bool(value) => Value::from(*value),
                PropertyValue::Int(value) => Value::from(*value),
                PropertyValue::Text(value) => Value::from(value.as_str()),
            };
            (key.to_string(), value)
        })
        .collect();
    Value::Object(map)
}

// =============================================================================
// Decoding
// =============================================================================

/// Decodes a diagram from JSON text.
///
/// # Errors
///
/// Fails on malformed JSON, on a document that is not a sequence diagram, on
/// unknown element types and on ids that are missing, duplicated or nested
/// inconsistently.
pub fn decode(source: &str) -> Result<Diagram, PersistenceError> {
    let document: DiagramDocument = serde_json::from_str(source)?;
    if document.diagram != DIAGRAM_TYPE {
        return Err(PersistenceError::DiagramType(document.diagram));
    }
    debug!(
        version:? = document.version,
        nodes = document.nodes.len(),
        edges = document.edges.len();
        "Decoding diagram"
    );

    let mut records: HashMap<u32, &NodeRecord> = HashMap::new();
    for record in &document.nodes {
        if records.insert(record.id, record).is_some() {
            return Err(PersistenceError::DuplicateId(record.id));
        }
    }
    let mut contained = HashSet::new();
    for record in &document.nodes {
        for child in &record.children {
            if !records.contains_key(child) {
                return Err(PersistenceError::DanglingId(*child));
            }
            if !contained.insert(*child) {
                return Err(PersistenceError::MultipleParents(*child));
            }
        }
    }

    let mut diagram = Diagram::new();
    let mut ids: HashMap<u32, NodeId> = HashMap::new();
    let mut pending: Vec<(&NodeRecord, Option<NodeId>)> = document
        .nodes
        .iter()
        .filter(|record| !contained.contains(&record.id))
        .rev()
        .map(|record| (record, None))
        .collect();

    while let Some((record, parent)) = pending.pop() {
        let kind = NodeKind::from_name(&record.kind)
            .ok_or_else(|| PersistenceError::UnknownNodeType(record.kind.clone()))?;
        let position = Point::new(record.x, record.y);
        let node = match parent {
            Some(parent) => {
                let node = diagram.add_child(parent, kind)?;
                diagram.set_position(node, position)?;
                node
            }
            None => diagram.add_root_node(kind, position),
        };
        let properties = diagram.node_properties_mut(node)?;
        for (key, value) in &record.properties {
            properties.set(key, value.clone());
        }
        ids.insert(record.id, node);

        for child in record.children.iter().rev() {
            let child = records
                .get(child)
                .ok_or(PersistenceError::DanglingId(*child))?;
            pending.push((child, Some(node)));
        }
    }

    // Nodes on a containment cycle are never reached from a root.
    if let Some(record) = document
        .nodes
        .iter()
        .find(|record| !ids.contains_key(&record.id))
    {
        return Err(PersistenceError::ContainmentCycle(record.id));
    }

    for record in &document.edges {
        let kind = EdgeKind::from_name(&record.kind)
            .ok_or_else(|| PersistenceError::UnknownEdgeType(record.kind.clone()))?;
        let start = *ids
            .get(&record.start)
            .ok_or(PersistenceError::DanglingId(record.start))?;
        let end = *ids
            .get(&record.end)
            .ok_or(PersistenceError::DanglingId(record.end))?;
        let edge = diagram.connect(kind, start, end)?;
        let properties = diagram.edge_properties_mut(edge)?;
        for (key, value) in &record.properties {
            properties.set(key, value.clone());
        }
    }

    info!(
        nodes = diagram.node_count(),
        edges = diagram.edge_count();
        "Diagram decoded"
    );
    Ok(diagram)
}

/// Reads and decodes the diagram file at `path`.
///
/// Decoding errors keep the file contents for error reporting.
pub fn read(path: impl AsRef<Path>) -> Result<Diagram, TraceryError> {
    let source = fs::read_to_string(path.as_ref())?;
    decode(&source).map_err(|err| TraceryError::new_persistence_error(err, source))
}
