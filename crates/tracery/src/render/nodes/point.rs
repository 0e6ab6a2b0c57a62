//! Invisible anchors for the free end of note edges.

use tracery_core::{
    diagram::{ModelError, NodeId, NodeKind},
    draw::LayeredOutput,
    geometry::{Direction, Point, Rectangle},
};

use crate::render::{DiagramRenderer, NodeRenderer};

#[derive(Debug, Clone, Copy, Default)]
pub struct PointNodeRenderer;

impl NodeRenderer for PointNodeRenderer {
    fn compute_bounds(
        &self,
        ctx: &DiagramRenderer<'_>,
        node: NodeId,
    ) -> Result<Rectangle, ModelError> {
        let point = ctx.node_of_kind(node, NodeKind::Point)?;
        Ok(Rectangle::degenerate(point.position()))
    }

    fn draw(
        &self,
        ctx: &DiagramRenderer<'_>,
        node: NodeId,
        _output: &mut LayeredOutput,
    ) -> Result<(), ModelError> {
        ctx.node_of_kind(node, NodeKind::Point)?;
        Ok(())
    }

    fn connection_point(
        &self,
        ctx: &DiagramRenderer<'_>,
        node: NodeId,
        _direction: Direction,
    ) -> Result<Point, ModelError> {
        Ok(ctx.node_of_kind(node, NodeKind::Point)?.position())
    }
}
