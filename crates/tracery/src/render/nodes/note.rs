//! Notes: free-floating text boxes with a folded top-right corner.

use tracery_core::{
    color::Color,
    diagram::{ModelError, NodeId, NodeKind},
    draw::{
        Alignment, LayeredOutput, RenderLayer, StrokeDefinition, TextDecorations, polygon,
        polyline, text_element,
    },
    geometry::{Dimension, Direction, Point, Rectangle},
};

use crate::render::{DiagramRenderer, NodeRenderer};

const MIN_WIDTH: i32 = 60;
const MIN_HEIGHT: i32 = 40;
/// Size of the folded corner.
const FOLD: i32 = 8;
/// Pale yellow.
const FILL: &str = "#FFFFE0";

#[derive(Debug, Clone, Copy, Default)]
pub struct NoteNodeRenderer;

impl NodeRenderer for NoteNodeRenderer {
    fn compute_bounds(
        &self,
        ctx: &DiagramRenderer<'_>,
        node: NodeId,
    ) -> Result<Rectangle, ModelError> {
        let note = ctx.node_of_kind(node, NodeKind::Note)?;
        let text = ctx
            .metrics()
            .measure(note.name(), Alignment::TopLeft, TextDecorations::PADDED);
        Ok(Rectangle::from_origin(
            note.position(),
            text.max(Dimension::new(MIN_WIDTH, MIN_HEIGHT)),
        ))
    }

    fn draw(
        &self,
        ctx: &DiagramRenderer<'_>,
        node: NodeId,
        output: &mut LayeredOutput,
    ) -> Result<(), ModelError> {
        let bounds = self.bounds(ctx, node)?;
        let color = ctx.foreground_color();
        let stroke = StrokeDefinition::solid(color, 1.0);
        let fill = Color::new(FILL).unwrap_or_default();

        let outline = [
            bounds.origin(),
            Point::new(bounds.max_x() - FOLD, bounds.y()),
            Point::new(bounds.max_x(), bounds.y() + FOLD),
            Point::new(bounds.max_x(), bounds.max_y()),
            Point::new(bounds.x(), bounds.max_y()),
        ];
        output.add_to_layer(RenderLayer::Note, Box::new(polygon(&outline, &stroke, fill)));

        let fold = [
            Point::new(bounds.max_x() - FOLD, bounds.y()),
            Point::new(bounds.max_x() - FOLD, bounds.y() + FOLD),
            Point::new(bounds.max_x(), bounds.y() + FOLD),
        ];
        output.add_to_layer(RenderLayer::Note, Box::new(polyline(&fold, &stroke)));

        let text = ctx.diagram().node(node)?.name();
        if !text.is_empty() {
            output.add_to_layer(
                RenderLayer::Text,
                Box::new(text_element(
                    ctx.metrics(),
                    text,
                    bounds,
                    Alignment::TopLeft,
                    TextDecorations::PADDED,
                    Some(color),
                )),
            );
        }
        Ok(())
    }

    fn connection_point(
        &self,
        ctx: &DiagramRenderer<'_>,
        node: NodeId,
        direction: Direction,
    ) -> Result<Point, ModelError> {
        Ok(self.bounds(ctx, node)?.boundary_point(direction))
    }

    /// The folded corner is cut off the silhouette.
    fn contains(
        &self,
        ctx: &DiagramRenderer<'_>,
        node: NodeId,
        point: Point,
    ) -> Result<bool, ModelError> {
        let bounds = self.bounds(ctx, node)?;
        if !bounds.contains(point) {
            return Ok(false);
        }
        let dx = bounds.max_x() - point.x();
        let dy = point.y() - bounds.y();
        Ok(dx + dy >= FOLD)
    }
}
