//! The composing renderer for a whole diagram.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use indexmap::IndexMap;
use log::{debug, info, trace, warn};
use svg::{Document, node::element as svg_element};

use tracery_core::{
    color::Color,
    diagram::{Diagram, EdgeId, EdgeKind, ModelError, Node, NodeId, NodeKind},
    draw::{LayeredOutput, TextMeasure},
    geometry::{Direction, Point, Rectangle},
};

use super::{
    CallEdgeRenderer, CallNodeRenderer, ConstructorEdgeRenderer, EdgeRenderer, ElementId,
    LifelineRenderer, NodeRenderer, NoteEdgeRenderer, NoteNodeRenderer, PointNodeRenderer,
    ReturnEdgeRenderer,
};
use crate::{control_flow::ControlFlow, storage::NodeStorage};

/// Space around the diagram in exported documents.
const DOCUMENT_MARGIN: i32 = 10;
/// Deepest chain of nested geometry computations, well within the stack of a
/// test thread. Only calls nested this deep, or a cycle, reach it.
const MAX_LAYOUT_DEPTH: usize = 256;

/// Renders the elements of one diagram.
///
/// The renderer borrows the diagram immutably, so the diagram cannot change
/// while the renderer exists. Create a new renderer after editing.
///
/// # Example
///
/// ```
/// # use tracery::render::DiagramRenderer;
/// # use tracery_core::diagram::{Diagram, NodeKind};
/// # use tracery_core::draw::MonospaceMetrics;
/// # use tracery_core::geometry::Point;
/// let mut diagram = Diagram::new();
/// let object = diagram.add_root_node(NodeKind::ImplicitParameter, Point::new(0, 0));
/// let call = diagram.add_child(object, NodeKind::Call).unwrap();
///
/// let metrics = MonospaceMetrics::default();
/// let renderer = DiagramRenderer::new(&diagram, &metrics);
/// let layout = renderer.layout().unwrap();
/// assert_eq!(layout.node(call).map(|bounds| bounds.height()), Some(30));
/// ```
#[derive(Debug)]
pub struct DiagramRenderer<'a> {
    diagram: &'a Diagram,
    metrics: &'a dyn TextMeasure,
    storage: NodeStorage,
    flow: RefCell<Option<Rc<ControlFlow<'a>>>>,
    depth: Cell<usize>,

    lifeline: LifelineRenderer,
    call: CallNodeRenderer,
    note: NoteNodeRenderer,
    point: PointNodeRenderer,

    call_edge: CallEdgeRenderer,
    constructor_edge: ConstructorEdgeRenderer,
    return_edge: ReturnEdgeRenderer,
    note_edge: NoteEdgeRenderer,
}

impl<'a> DiagramRenderer<'a> {
    pub fn new(diagram: &'a Diagram, metrics: &'a dyn TextMeasure) -> Self {
        Self {
            diagram,
            metrics,
            storage: NodeStorage::new(),
            flow: RefCell::new(None),
            depth: Cell::new(0),
            lifeline: LifelineRenderer,
            call: CallNodeRenderer,
            note: NoteNodeRenderer,
            point: PointNodeRenderer,
            call_edge: CallEdgeRenderer,
            constructor_edge: ConstructorEdgeRenderer,
            return_edge: ReturnEdgeRenderer,
            note_edge: NoteEdgeRenderer,
        }
    }

    pub fn diagram(&self) -> &'a Diagram {
        self.diagram
    }

    pub fn metrics(&self) -> &dyn TextMeasure {
        self.metrics
    }

    pub fn storage(&self) -> &NodeStorage {
        &self.storage
    }

    /// Color of outlines, lines and text.
    pub fn foreground_color(&self) -> Color {
        Color::default()
    }

    /// Color of selection handles.
    pub fn selection_color(&self) -> Color {
        Color::new("steelblue").unwrap_or_default()
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// The renderer responsible for nodes of `kind`.
    pub fn node_renderer(&self, kind: NodeKind) -> &dyn NodeRenderer {
        match kind {
            NodeKind::ImplicitParameter => &self.lifeline,
            NodeKind::Call => &self.call,
            NodeKind::Note => &self.note,
            NodeKind::Point => &self.point,
        }
    }

    /// The renderer responsible for edges of `kind`.
    pub fn edge_renderer(&self, kind: EdgeKind) -> &dyn EdgeRenderer {
        match kind {
            EdgeKind::Call => &self.call_edge,
            EdgeKind::Constructor => &self.constructor_edge,
            EdgeKind::Return => &self.return_edge,
            EdgeKind::Note => &self.note_edge,
        }
    }

    /// Returns the node for `id` if it is of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Precondition`] if the node is not attached to the
    /// diagram or is of another kind.
    pub fn node_of_kind(&self, id: NodeId, kind: NodeKind) -> Result<&'a Node, ModelError> {
        let node = self.diagram.node(id)?;
        if node.kind() != kind {
            return Err(ModelError::Precondition(format!(
                "{id} is a {}, expected a {kind}",
                node.kind()
            )));
        }
        Ok(node)
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    /// Bounds of a node.
    pub fn node_bounds(&self, node: NodeId) -> Result<Rectangle, ModelError> {
        let kind = self.diagram.node(node)?.kind();
        self.node_renderer(kind).bounds(self, node)
    }

    /// Bounds of an edge, including its label.
    pub fn edge_bounds(&self, edge: EdgeId) -> Result<Rectangle, ModelError> {
        let kind = self.diagram.edge(edge)?.kind();
        self.edge_renderer(kind).bounds(self, edge)
    }

    /// Point on the boundary of `node` facing `direction`.
    pub fn connection_point(&self, node: NodeId, direction: Direction) -> Result<Point, ModelError> {
        let kind = self.diagram.node(node)?.kind();
        self.node_renderer(kind)
            .connection_point(self, node, direction)
    }

    /// Returns `true` if `point` hits `element`.
    pub fn contains(&self, element: ElementId, point: Point) -> Result<bool, ModelError> {
        match element {
            ElementId::Node(node) => {
                let kind = self.diagram.node(node)?.kind();
                self.node_renderer(kind).contains(self, node, point)
            }
            ElementId::Edge(edge) => {
                let kind = self.diagram.edge(edge)?.kind();
                self.edge_renderer(kind).contains(self, edge, point)
            }
        }
    }

    /// The control flow of the diagram.
    ///
    /// Inside a layout session the view built when the session started is
    /// shared; otherwise a fresh view is built for every call.
    pub fn control_flow(&self) -> Result<Rc<ControlFlow<'a>>, ModelError> {
        if let Some(flow) = self.flow.borrow().as_ref() {
            return Ok(Rc::clone(flow));
        }
        ControlFlow::build(self.diagram).map(Rc::new)
    }

    /// Starts a layout session. See [`LayoutSession`].
    pub fn session(&self) -> LayoutSession<'_, 'a> {
        LayoutSession::begin(self)
    }

    /// Tracks the depth of mutually recursive geometry computations.
    pub(crate) fn enter(&self) -> Result<DepthGuard<'_>, ModelError> {
        let depth = self.depth.get() + 1;
        if depth > MAX_LAYOUT_DEPTH {
            return Err(ModelError::Structure(format!(
                "layout dependencies nest deeper than {MAX_LAYOUT_DEPTH} levels"
            )));
        }
        self.depth.set(depth);
        Ok(DepthGuard { depth: &self.depth })
    }

    // =========================================================================
    // Passes
    // =========================================================================

    /// Computes the bounds of every node (pre-order) and every edge.
    ///
    /// Elements whose structure is inconsistent are logged, skipped and given a
    /// zero-area rectangle; the pass continues with the remaining elements.
    ///
    /// # Errors
    ///
    /// Precondition violations abort the pass.
    pub fn layout(&self) -> Result<Layout, ModelError> {
        let _session = self.session();
        info!(
            nodes = self.diagram.node_count(),
            edges = self.diagram.edge_count();
            "Starting layout pass"
        );

        let mut layout = Layout::default();
        let mut extent: Option<Rectangle> = None;

        for node in self.diagram.all_nodes() {
            let position = self.diagram.node(node)?.position();
            let bounds = match tolerate(node.into(), self.node_bounds(node))? {
                Some(bounds) => {
                    extent = Some(extent.map_or(bounds, |extent| extent.add(bounds)));
                    bounds
                }
                None => {
                    layout.skipped.push(node.into());
                    Rectangle::degenerate(position)
                }
            };
            trace!(node:% = node, bounds:% = bounds; "Node laid out");
            layout.nodes.insert(node, bounds);
        }

        for (edge, _) in self.diagram.edges() {
            let bounds = match tolerate(edge.into(), self.edge_bounds(edge))? {
                Some(bounds) => {
                    extent = Some(extent.map_or(bounds, |extent| extent.add(bounds)));
                    bounds
                }
                None => {
                    layout.skipped.push(edge.into());
                    Rectangle::default()
                }
            };
            trace!(edge:% = edge, bounds:% = bounds; "Edge laid out");
            layout.edges.insert(edge, bounds);
        }

        layout.bounds = extent.unwrap_or_default();
        info!(
            bounds:% = layout.bounds,
            skipped = layout.skipped.len();
            "Layout pass finished"
        );
        Ok(layout)
    }

    /// Draws every element, then the selection handles of `selection`.
    pub fn draw(&self, selection: &[ElementId]) -> Result<LayeredOutput, ModelError> {
        let _session = self.session();
        let mut output = LayeredOutput::new();

        for node in self.diagram.all_nodes() {
            let kind = self.diagram.node(node)?.kind();
            let mut drawn = LayeredOutput::new();
            if tolerate(node.into(), self.node_renderer(kind).draw(self, node, &mut drawn))?.is_some()
            {
                output.merge(drawn);
            }
        }
        for (edge, data) in self.diagram.edges() {
            let mut drawn = LayeredOutput::new();
            let result = self.edge_renderer(data.kind()).draw(self, edge, &mut drawn);
            if tolerate(edge.into(), result)?.is_some() {
                output.merge(drawn);
            }
        }

        for element in selection {
            let mut drawn = LayeredOutput::new();
            let result = match *element {
                ElementId::Node(node) => {
                    let kind = self.diagram.node(node)?.kind();
                    self.node_renderer(kind)
                        .draw_selection_handles(self, node, &mut drawn)
                }
                ElementId::Edge(edge) => {
                    let kind = self.diagram.edge(edge)?.kind();
                    self.edge_renderer(kind)
                        .draw_selection_handles(self, edge, &mut drawn)
                }
            };
            if tolerate(*element, result)?.is_some() {
                output.merge(drawn);
            }
        }

        debug!(svg_nodes = output.len(); "Diagram drawn");
        Ok(output)
    }

    /// Renders the diagram as an SVG document.
    pub fn render_svg(&self, background: Option<Color>) -> Result<String, ModelError> {
        let _session = self.session();
        let layout = self.layout()?;
        self.render_layout_svg(&layout, background)
    }

    /// Renders the diagram as an SVG document, reusing the node bounds of
    /// `layout` instead of computing them again. `layout` must come from this
    /// diagram in its current state.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Precondition`] if `layout` holds nodes that are not
    /// part of this diagram.
    pub fn render_layout_svg(
        &self,
        layout: &Layout,
        background: Option<Color>,
    ) -> Result<String, ModelError> {
        let _session = self.session();
        for (node, bounds) in layout.nodes() {
            if !self.diagram.contains_node(node) {
                return Err(ModelError::Precondition(format!(
                    "{node} in the layout is not part of this diagram"
                )));
            }
            if !layout.skipped.contains(&ElementId::Node(node)) {
                self.storage.seed(node, bounds);
            }
        }
        let output = self.draw(&[])?;

        let area = layout.bounds().expanded(DOCUMENT_MARGIN);
        let mut document = Document::new()
            .set(
                "viewBox",
                format!("{} {} {} {}", area.x(), area.y(), area.width(), area.height()),
            )
            .set("width", area.width())
            .set("height", area.height());

        if let Some(color) = background {
            document = document.add(
                svg_element::Rectangle::new()
                    .set("x", area.x())
                    .set("y", area.y())
                    .set("width", area.width())
                    .set("height", area.height())
                    .set("fill", color.to_string())
                    .set("fill-opacity", color.alpha()),
            );
        }
        for node in output.render() {
            document = document.add(node);
        }

        Ok(document.to_string())
    }

    /// The topmost element at `point`: edges first, then nodes, children before
    /// their parents.
    ///
    /// Runs without a session, so the answer always reflects the current diagram.
    pub fn element_at(&self, point: Point) -> Result<Option<ElementId>, ModelError> {
        let edges: Vec<EdgeId> = self.diagram.edges().map(|(id, _)| id).collect();
        for edge in edges.into_iter().rev() {
            if tolerate(edge.into(), self.contains(edge.into(), point))? == Some(true) {
                return Ok(Some(edge.into()));
            }
        }
        for node in self.diagram.all_nodes().into_iter().rev() {
            if tolerate(node.into(), self.contains(node.into(), point))? == Some(true) {
                return Ok(Some(node.into()));
            }
        }
        Ok(None)
    }
}

/// Turns structural errors into `None` after logging them.
fn tolerate<T>(element: ElementId, result: Result<T, ModelError>) -> Result<Option<T>, ModelError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ModelError::Structure(reason)) => {
            warn!(element:% = element, reason:% = reason; "Skipping element with inconsistent structure");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Decrements the recursion depth when dropped.
pub(crate) struct DepthGuard<'r> {
    depth: &'r Cell<usize>,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

/// Scope in which node bounds are computed at most once.
///
/// Creating the outermost session activates the renderer's node storage and
/// pins one control flow view; dropping it, on any exit path, clears both.
/// Sessions started while another one is running leave it in charge.
///
/// ```
/// # use tracery::render::DiagramRenderer;
/// # use tracery_core::diagram::Diagram;
/// # use tracery_core::draw::MonospaceMetrics;
/// let diagram = Diagram::new();
/// let metrics = MonospaceMetrics::default();
/// let renderer = DiagramRenderer::new(&diagram, &metrics);
/// {
///     let _session = renderer.session();
///     assert!(renderer.storage().is_active());
/// }
/// assert!(!renderer.storage().is_active());
/// ```
#[derive(Debug)]
pub struct LayoutSession<'r, 'a> {
    renderer: &'r DiagramRenderer<'a>,
    outermost: bool,
}

impl<'r, 'a> LayoutSession<'r, 'a> {
    fn begin(renderer: &'r DiagramRenderer<'a>) -> Self {
        let outermost = !renderer.storage.is_active();
        if outermost {
            renderer.storage.activate();
            match ControlFlow::build(renderer.diagram) {
                Ok(flow) => *renderer.flow.borrow_mut() = Some(Rc::new(flow)),
                Err(err) => debug!(err:% = err; "Control flow not pinned for session"),
            }
            debug!("Layout session started");
        }
        Self {
            renderer,
            outermost,
        }
    }

    /// Returns `true` if this session activated the node storage.
    pub fn is_outermost(&self) -> bool {
        self.outermost
    }
}

impl Drop for LayoutSession<'_, '_> {
    fn drop(&mut self) {
        if self.outermost {
            self.renderer.storage.deactivate_and_clear();
            self.renderer.flow.borrow_mut().take();
            debug!("Layout session ended");
        }
    }
}

/// Result of a layout pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    nodes: IndexMap<NodeId, Rectangle>,
    edges: IndexMap<EdgeId, Rectangle>,
    bounds: Rectangle,
    skipped: Vec<ElementId>,
}

impl Layout {
    pub fn node(&self, id: NodeId) -> Option<Rectangle> {
        self.nodes.get(&id).copied()
    }

    pub fn edge(&self, id: EdgeId) -> Option<Rectangle> {
        self.edges.get(&id).copied()
    }

    /// Node bounds in pre-order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, Rectangle)> + '_ {
        self.nodes.iter().map(|(id, bounds)| (*id, *bounds))
    }

    /// Edge bounds in diagram order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, Rectangle)> + '_ {
        self.edges.iter().map(|(id, bounds)| (*id, *bounds))
    }

    /// Union of the bounds of every laid out element.
    pub fn bounds(&self) -> Rectangle {
        self.bounds
    }

    /// Elements left out because their structure is inconsistent.
    pub fn skipped(&self) -> &[ElementId] {
        &self.skipped
    }
}
