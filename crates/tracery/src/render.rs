//! Renderers for interaction diagram elements.
//!
//! Every node kind has a [`NodeRenderer`] and every edge kind an
//! [`EdgeRenderer`]. A [`DiagramRenderer`] owns one of each and dispatches on
//! the element's kind tag. Renderers are stateless; the diagram, the text
//! metrics, the node storage and the control flow are reached through the
//! [`DiagramRenderer`] passed to every method.
//!
//! Geometry is computed on demand. Wrap a batch of queries in a
//! [`LayoutSession`] to compute each node's bounds only once.

mod diagram;
mod edges;
mod nodes;

pub use diagram::{DiagramRenderer, Layout, LayoutSession};
pub use edges::{
    Arrowhead, CallEdgeRenderer, ConstructorEdgeRenderer, EdgePath, NoteEdgeRenderer,
    ReturnEdgeRenderer,
};
pub use nodes::{CallNodeRenderer, LifelineRenderer, NoteNodeRenderer, PointNodeRenderer};

use std::fmt;

use tracery_core::{
    color::Color,
    diagram::{EdgeId, ModelError, NodeId},
    draw::{LayeredOutput, RenderLayer, StrokeDefinition, selection_handle, selection_handles},
    geometry::{Direction, Point, Rectangle},
};

/// A node or an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementId {
    Node(NodeId),
    Edge(EdgeId),
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(id) => id.fmt(f),
            Self::Edge(id) => id.fmt(f),
        }
    }
}

impl From<NodeId> for ElementId {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<EdgeId> for ElementId {
    fn from(id: EdgeId) -> Self {
        Self::Edge(id)
    }
}

/// Capabilities of a node-kind specific renderer.
///
/// All methods fail with [`ModelError::Precondition`] when `node` does not
/// belong to the renderer's diagram or is not of the renderer's kind.
pub trait NodeRenderer: fmt::Debug {
    /// Computes the bounds of `node` from scratch. Callers should go through
    /// [`NodeRenderer::bounds`], which consults the node storage.
    fn compute_bounds(&self, ctx: &DiagramRenderer<'_>, node: NodeId)
    -> Result<Rectangle, ModelError>;

    /// Draws `node` into `output`.
    fn draw(
        &self,
        ctx: &DiagramRenderer<'_>,
        node: NodeId,
        output: &mut LayeredOutput,
    ) -> Result<(), ModelError>;

    /// Point on the boundary of `node` that an edge leaving in `direction`
    /// attaches to.
    fn connection_point(
        &self,
        ctx: &DiagramRenderer<'_>,
        node: NodeId,
        direction: Direction,
    ) -> Result<Point, ModelError>;

    /// Bounds of `node`, cached while a layout session is active.
    fn bounds(&self, ctx: &DiagramRenderer<'_>, node: NodeId) -> Result<Rectangle, ModelError> {
        ctx.storage()
            .get_or_compute(node, || self.compute_bounds(ctx, node))
    }

    /// Returns `true` if `point` lies on the silhouette of `node`.
    fn contains(
        &self,
        ctx: &DiagramRenderer<'_>,
        node: NodeId,
        point: Point,
    ) -> Result<bool, ModelError> {
        Ok(self.bounds(ctx, node)?.contains(point))
    }

    /// Draws the handles shown around a selected node.
    fn draw_selection_handles(
        &self,
        ctx: &DiagramRenderer<'_>,
        node: NodeId,
        output: &mut LayeredOutput,
    ) -> Result<(), ModelError> {
        selection_handles(self.bounds(ctx, node)?, ctx.selection_color(), output);
        Ok(())
    }
}

/// Capabilities of an edge-kind specific renderer.
///
/// Edge geometry is fully described by an [`EdgePath`]; bounds, hit-testing
/// and drawing derive from it.
pub trait EdgeRenderer: fmt::Debug {
    /// The path of `edge`, computed from its endpoints' geometry.
    fn path(&self, ctx: &DiagramRenderer<'_>, edge: EdgeId) -> Result<EdgePath, ModelError>;

    /// Bounds of the path united with the bounds of the middle label.
    fn bounds(&self, ctx: &DiagramRenderer<'_>, edge: EdgeId) -> Result<Rectangle, ModelError> {
        let path = self.path(ctx, edge)?;
        let label = ctx.diagram().edge(edge)?.middle_label();
        Ok(match path.label_bounds(ctx.metrics(), label) {
            Some(label) => path.bounds().add(label),
            None => path.bounds(),
        })
    }

    /// Returns `true` if `point` is close to the path.
    fn contains(
        &self,
        ctx: &DiagramRenderer<'_>,
        edge: EdgeId,
        point: Point,
    ) -> Result<bool, ModelError> {
        Ok(self.path(ctx, edge)?.is_near(point))
    }

    /// Draws `edge` into `output`.
    fn draw(
        &self,
        ctx: &DiagramRenderer<'_>,
        edge: EdgeId,
        output: &mut LayeredOutput,
    ) -> Result<(), ModelError> {
        let path = self.path(ctx, edge)?;
        let label = ctx.diagram().edge(edge)?.middle_label();
        path.draw(ctx.metrics(), label, ctx.foreground_color(), output);
        Ok(())
    }

    /// Draws handles on both ends of a selected edge.
    fn draw_selection_handles(
        &self,
        ctx: &DiagramRenderer<'_>,
        edge: EdgeId,
        output: &mut LayeredOutput,
    ) -> Result<(), ModelError> {
        let path = self.path(ctx, edge)?;
        for end in [path.start(), path.end()] {
            selection_handle(end, ctx.selection_color(), output);
        }
        Ok(())
    }
}

/// Adds a white-filled outlined rectangle on `layer`.
fn filled_rectangle(bounds: Rectangle, color: Color, layer: RenderLayer, output: &mut LayeredOutput) {
    let element = tracery_core::draw::rectangle(
        bounds,
        &StrokeDefinition::solid(color, 1.0),
        Color::new("white").ok(),
    );
    output.add_to_layer(layer, Box::new(element));
}
