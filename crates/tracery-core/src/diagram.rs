//! Interaction diagram element model.
//!
//! A [`Diagram`] owns its nodes and edges in an arena. Elements are referred
//! to by [`NodeId`] and [`EdgeId`] handles that remember which diagram issued
//! them, so the model can tell whether an element belongs to it.
//!
//! # Structure
//!
//! - Nodes form a containment forest: a node has an optional parent and an
//!   ordered list of children. Call nodes live inside lifelines
//!   ([`NodeKind::ImplicitParameter`]).
//! - Edges are directed and connect two nodes of the same diagram. The order in
//!   which edges were added is significant: it is the order of calls.
//! - Every element carries ordered [`Properties`].
//!
//! # Identity
//!
//! Removing an element leaves a tombstone; its id is never reused. Queries
//! with an id issued by another diagram, or with the id of a removed element,
//! fail with [`ModelError::Precondition`].
//!
//! # Example
//!
//! ```
//! # use tracery_core::diagram::{Diagram, EdgeKind, NodeKind};
//! # use tracery_core::geometry::Point;
//! # fn main() -> Result<(), tracery_core::diagram::ModelError> {
//! let mut diagram = Diagram::new();
//! let client = diagram.add_root_node(NodeKind::ImplicitParameter, Point::new(0, 0));
//! let server = diagram.add_root_node(NodeKind::ImplicitParameter, Point::new(200, 0));
//!
//! let request = diagram.add_child(client, NodeKind::Call)?;
//! let handle = diagram.add_child(server, NodeKind::Call)?;
//! diagram.connect(EdgeKind::Call, request, handle)?;
//!
//! assert_eq!(diagram.node(handle)?.parent(), Some(server));
//! assert_eq!(diagram.edges().count(), 1);
//! # Ok(())
//! # }
//! ```

mod properties;

pub use properties::{Properties, PropertyValue, keys};

use std::{
    fmt,
    sync::atomic::{AtomicU32, Ordering},
};

use log::trace;
use thiserror::Error;

use crate::geometry::Point;

static NEXT_DIAGRAM_ID: AtomicU32 = AtomicU32::new(0);

/// Errors raised when the element model is used outside its contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The caller passed an argument that violates a precondition, such as a
    /// node that is not attached to the diagram being queried.
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// The diagram structure itself is inconsistent, for example a cyclic call
    /// relation or a call node outside of any lifeline.
    #[error("structural inconsistency: {0}")]
    Structure(String),
}

impl ModelError {
    fn detached_node(id: NodeId) -> Self {
        Self::Precondition(format!("{id} is not attached to this diagram"))
    }

    fn detached_edge(id: EdgeId) -> Self {
        Self::Precondition(format!("{id} is not attached to this diagram"))
    }
}

/// Process-unique identity of a [`Diagram`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DiagramId(u32);

/// Handle to a node of a specific diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    diagram: DiagramId,
    index: u32,
}

impl NodeId {
    /// The diagram that issued this id.
    pub fn diagram(self) -> DiagramId {
        self.diagram
    }

    fn index(self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.index)
    }
}

/// Handle to an edge of a specific diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId {
    diagram: DiagramId,
    index: u32,
}

impl EdgeId {
    /// The diagram that issued this id.
    pub fn diagram(self) -> DiagramId {
        self.diagram
    }

    fn index(self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "edge#{}", self.index)
    }
}

/// The closed set of node kinds of an interaction diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A lifeline: an object's timeline, drawn as a named box with a dashed line below.
    ImplicitParameter,
    /// One activation (method execution) on a lifeline.
    Call,
    /// A free-standing note.
    Note,
    /// An invisible anchor used as the free end of a note edge.
    Point,
}

impl NodeKind {
    /// Stable name used by the persistence format.
    pub fn name(self) -> &'static str {
        match self {
            Self::ImplicitParameter => "ImplicitParameterNode",
            Self::Call => "CallNode",
            Self::Note => "NoteNode",
            Self::Point => "PointNode",
        }
    }

    /// Inverse of [`NodeKind::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ImplicitParameterNode" => Some(Self::ImplicitParameter),
            "CallNode" => Some(Self::Call),
            "NoteNode" => Some(Self::Note),
            "PointNode" => Some(Self::Point),
            _ => None,
        }
    }

    /// Returns `true` if a node of this kind may contain a node of `child` kind.
    pub fn accepts_child(self, child: NodeKind) -> bool {
        matches!((self, child), (Self::ImplicitParameter, Self::Call))
    }

    fn default_properties(self) -> Properties {
        let mut properties = Properties::new();
        match self {
            Self::ImplicitParameter | Self::Note => properties.set(keys::NAME, ""),
            Self::Call => properties.set(keys::OPEN_BOTTOM, false),
            Self::Point => {}
        }
        properties
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The closed set of edge kinds of an interaction diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// A call from one activation to another.
    Call,
    /// A call that creates the lifeline containing its target.
    Constructor,
    /// The return of a call, drawn back to the caller.
    Return,
    /// Attaches a note to another node.
    Note,
}

impl EdgeKind {
    /// Stable name used by the persistence format.
    pub fn name(self) -> &'static str {
        match self {
            Self::Call => "CallEdge",
            Self::Constructor => "ConstructorEdge",
            Self::Return => "ReturnEdge",
            Self::Note => "NoteEdge",
        }
    }

    /// Inverse of [`EdgeKind::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "CallEdge" => Some(Self::Call),
            "ConstructorEdge" => Some(Self::Constructor),
            "ReturnEdge" => Some(Self::Return),
            "NoteEdge" => Some(Self::Note),
            _ => None,
        }
    }

    /// Returns `true` for edges that establish a caller/callee relation.
    pub fn is_call(self) -> bool {
        matches!(self, Self::Call | Self::Constructor)
    }

    fn default_properties(self) -> Properties {
        let mut properties = Properties::new();
        match self {
            Self::Call => {
                properties.set(keys::MIDDLE_LABEL, "");
                properties.set(keys::SIGNAL, false);
            }
            Self::Constructor | Self::Return => properties.set(keys::MIDDLE_LABEL, ""),
            Self::Note => {}
        }
        properties
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A node of a diagram.
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    position: Point,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    properties: Properties,
}

impl Node {
    fn new(kind: NodeKind, position: Point, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            position,
            parent,
            children: Vec::new(),
            properties: kind.default_properties(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Position chosen by the user. Only meaningful for free-standing nodes;
    /// the position of call nodes is always computed.
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// The `name` property, or an empty string.
    pub fn name(&self) -> &str {
        self.properties.get_str(keys::NAME).unwrap_or_default()
    }

    /// Returns `true` for call nodes still active at the visual end of the diagram.
    pub fn is_open_bottom(&self) -> bool {
        self.properties
            .get_bool(keys::OPEN_BOTTOM)
            .unwrap_or_default()
    }
}

/// A directed edge of a diagram.
#[derive(Debug, Clone)]
pub struct Edge {
    kind: EdgeKind,
    start: NodeId,
    end: NodeId,
    properties: Properties,
}

impl Edge {
    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    pub fn start(&self) -> NodeId {
        self.start
    }

    pub fn end(&self) -> NodeId {
        self.end
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// The `middleLabel` property, or an empty string.
    pub fn middle_label(&self) -> &str {
        self.properties
            .get_str(keys::MIDDLE_LABEL)
            .unwrap_or_default()
    }
}

/// An interaction diagram: an arena of nodes and edges.
#[derive(Debug)]
pub struct Diagram {
    id: DiagramId,
    nodes: Vec<Option<Node>>,
    edges: Vec<Option<Edge>>,
    roots: Vec<NodeId>,
}

impl Default for Diagram {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagram {
    /// Creates an empty diagram with a fresh identity.
    pub fn new() -> Self {
        Self {
            id: DiagramId(NEXT_DIAGRAM_ID.fetch_add(1, Ordering::Relaxed)),
            nodes: Vec::new(),
            edges: Vec::new(),
            roots: Vec::new(),
        }
    }

    pub fn id(&self) -> DiagramId {
        self.id
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Returns `true` if `id` refers to a live node of this diagram.
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    /// Returns `true` if `id` refers to a live edge of this diagram.
    pub fn contains_edge(&self, id: EdgeId) -> bool {
        self.edge_slot(id).is_some()
    }

    /// Returns the node for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Precondition`] if the node is not attached to this diagram.
    pub fn node(&self, id: NodeId) -> Result<&Node, ModelError> {
        self.slot(id).ok_or_else(|| ModelError::detached_node(id))
    }

    /// Returns the edge for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Precondition`] if the edge is not attached to this diagram.
    pub fn edge(&self, id: EdgeId) -> Result<&Edge, ModelError> {
        self.edge_slot(id)
            .ok_or_else(|| ModelError::detached_edge(id))
    }

    /// Top-level nodes, in insertion order.
    pub fn root_nodes(&self) -> &[NodeId] {
        &self.roots
    }

    /// Every node of the diagram: roots in order, each followed by its
    /// descendants in pre-order.
    pub fn all_nodes(&self) -> Vec<NodeId> {
        let mut result = Vec::with_capacity(self.nodes.len());
        for root in &self.roots {
            self.collect_subtree(*root, &mut result);
        }
        result
    }

    /// Every edge of the diagram, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> + '_ {
        self.edges.iter().enumerate().filter_map(|(index, edge)| {
            edge.as_ref().map(|edge| {
                (
                    EdgeId {
                        diagram: self.id,
                        index: index as u32,
                    },
                    edge,
                )
            })
        })
    }

    /// Edges that start or end at `node`, in insertion order.
    pub fn edges_connected_to(&self, node: NodeId) -> impl Iterator<Item = (EdgeId, &Edge)> + '_ {
        self.edges()
            .filter(move |(_, edge)| edge.start == node || edge.end == node)
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    /// Number of live edges.
    pub fn edge_count(&self) -> usize {
        self.edges.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds a top-level node at `position`.
    pub fn add_root_node(&mut self, kind: NodeKind, position: Point) -> NodeId {
        let id = self.next_node_id();
        self.nodes.push(Some(Node::new(kind, position, None)));
        self.roots.push(id);
        trace!(node:% = id, kind:% = kind; "Added root node");
        id
    }

    /// Appends a new node of `kind` to the children of `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Precondition`] if `parent` is not attached to this
    /// diagram or cannot contain nodes of `kind`.
    pub fn add_child(&mut self, parent: NodeId, kind: NodeKind) -> Result<NodeId, ModelError> {
        let index = self.node(parent)?.children.len();
        self.insert_child(parent, index, kind)
    }

    /// Inserts a new node of `kind` at `index` among the children of `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Precondition`] if `parent` is not attached to this
    /// diagram, cannot contain nodes of `kind`, or `index` is out of range.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        kind: NodeKind,
    ) -> Result<NodeId, ModelError> {
        let parent_node = self.node(parent)?;
        if !parent_node.kind.accepts_child(kind) {
            return Err(ModelError::Precondition(format!(
                "{} cannot contain a {kind}",
                parent_node.kind
            )));
        }
        if index > parent_node.children.len() {
            return Err(ModelError::Precondition(format!(
                "child index {index} out of range for {parent}"
            )));
        }

        let id = self.next_node_id();
        self.nodes.push(Some(Node::new(kind, Point::default(), Some(parent))));
        self.node_mut(parent)?.children.insert(index, id);
        trace!(node:% = id, parent:% = parent, kind:% = kind; "Added child node");
        Ok(id)
    }

    /// Removes `id`, its descendants and every edge connected to any of them.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Precondition`] if the node is not attached to this diagram.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), ModelError> {
        self.detach(id)?;

        let mut removed = Vec::new();
        self.collect_subtree(id, &mut removed);
        for node in &removed {
            self.nodes[node.index()] = None;
        }
        for slot in &mut self.edges {
            let touches_removed = slot
                .as_ref()
                .is_some_and(|edge| removed.contains(&edge.start) || removed.contains(&edge.end));
            if touches_removed {
                *slot = None;
            }
        }

        trace!(node:% = id, removed_count = removed.len(); "Removed node");
        Ok(())
    }

    /// Moves `id` to the end of `new_parent`'s children.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Precondition`] if either node is not attached,
    /// `new_parent` cannot contain `id`, or `new_parent` is inside `id`'s subtree.
    pub fn reparent(&mut self, id: NodeId, new_parent: NodeId) -> Result<(), ModelError> {
        let kind = self.node(id)?.kind;
        let parent_kind = self.node(new_parent)?.kind;
        if !parent_kind.accepts_child(kind) {
            return Err(ModelError::Precondition(format!(
                "{parent_kind} cannot contain a {kind}"
            )));
        }

        let mut subtree = Vec::new();
        self.collect_subtree(id, &mut subtree);
        if subtree.contains(&new_parent) {
            return Err(ModelError::Precondition(format!(
                "cannot move {id} inside its own subtree"
            )));
        }

        self.detach(id)?;
        self.node_mut(id)?.parent = Some(new_parent);
        self.node_mut(new_parent)?.children.push(id);
        trace!(node:% = id, parent:% = new_parent; "Reparented node");
        Ok(())
    }

    /// Moves a node to `position`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Precondition`] if the node is not attached to this diagram.
    pub fn set_position(&mut self, id: NodeId, position: Point) -> Result<(), ModelError> {
        self.node_mut(id)?.position = position;
        Ok(())
    }

    /// Mutable access to the properties of a node.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Precondition`] if the node is not attached to this diagram.
    pub fn node_properties_mut(&mut self, id: NodeId) -> Result<&mut Properties, ModelError> {
        Ok(&mut self.node_mut(id)?.properties)
    }

    /// Adds an edge of `kind` from `start` to `end`.
    ///
    /// Call, constructor and return edges must connect two call nodes. Note
    /// edges must have a note at one of their ends.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Precondition`] if an endpoint is not attached to
    /// this diagram or the endpoint kinds do not fit the edge kind.
    pub fn connect(
        &mut self,
        kind: EdgeKind,
        start: NodeId,
        end: NodeId,
    ) -> Result<EdgeId, ModelError> {
        let start_kind = self.node(start)?.kind;
        let end_kind = self.node(end)?.kind;

        let valid = match kind {
            EdgeKind::Call | EdgeKind::Constructor | EdgeKind::Return => {
                start_kind == NodeKind::Call && end_kind == NodeKind::Call
            }
            EdgeKind::Note => start_kind == NodeKind::Note || end_kind == NodeKind::Note,
        };
        if !valid {
            return Err(ModelError::Precondition(format!(
                "a {kind} cannot connect a {start_kind} to a {end_kind}"
            )));
        }

        let id = EdgeId {
            diagram: self.id,
            index: self.edges.len() as u32,
        };
        self.edges.push(Some(Edge {
            kind,
            start,
            end,
            properties: kind.default_properties(),
        }));
        trace!(edge:% = id, start:% = start, end:% = end, kind:% = kind; "Connected nodes");
        Ok(id)
    }

    /// Removes an edge.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Precondition`] if the edge is not attached to this diagram.
    pub fn remove_edge(&mut self, id: EdgeId) -> Result<(), ModelError> {
        self.edge(id)?;
        self.edges[id.index()] = None;
        Ok(())
    }

    /// Mutable access to the properties of an edge.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Precondition`] if the edge is not attached to this diagram.
    pub fn edge_properties_mut(&mut self, id: EdgeId) -> Result<&mut Properties, ModelError> {
        if id.diagram != self.id {
            return Err(ModelError::detached_edge(id));
        }
        self.edges
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .map(|edge| &mut edge.properties)
            .ok_or_else(|| ModelError::detached_edge(id))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn next_node_id(&self) -> NodeId {
        NodeId {
            diagram: self.id,
            index: self.nodes.len() as u32,
        }
    }

    fn slot(&self, id: NodeId) -> Option<&Node> {
        if id.diagram != self.id {
            return None;
        }
        self.nodes.get(id.index())?.as_ref()
    }

    fn edge_slot(&self, id: EdgeId) -> Option<&Edge> {
        if id.diagram != self.id {
            return None;
        }
        self.edges.get(id.index())?.as_ref()
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, ModelError> {
        if id.diagram != self.id {
            return Err(ModelError::detached_node(id));
        }
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or_else(|| ModelError::detached_node(id))
    }

    /// Unlinks `id` from its parent's children, or from the roots.
    fn detach(&mut self, id: NodeId) -> Result<(), ModelError> {
        match self.node(id)?.parent {
            Some(parent) => self.node_mut(parent)?.children.retain(|child| *child != id),
            None => self.roots.retain(|root| *root != id),
        }
        self.node_mut(id)?.parent = None;
        Ok(())
    }

    fn collect_subtree(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.slot(current) {
                out.push(current);
                stack.extend(node.children.iter().rev());
            }
        }
    }
}
