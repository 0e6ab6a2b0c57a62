//! Lifelines (implicit parameter nodes).
//!
//! A lifeline is a box holding the underlined object name, with a dashed line
//! running down from it. The line extends below the lowest call on the
//! lifeline.
//!
//! The box normally sits at the top of the diagram. A lifeline created by a
//! constructor call starts lower, next to the call that created it.

use log::trace;

use tracery_core::{
    diagram::{ModelError, NodeId, NodeKind},
    draw::{
        Alignment, LayeredOutput, RenderLayer, StrokeDefinition, TextDecorations, line,
        text_element,
    },
    geometry::{Direction, Point, Rectangle},
};

use super::CallNodeRenderer;
use crate::render::{DiagramRenderer, NodeRenderer, filled_rectangle};

/// Minimum width of the top box.
pub const MIN_WIDTH: i32 = 80;
/// Height of the top box.
pub const TOP_HEIGHT: i32 = 60;
/// Horizontal room on each side of the name.
const NAME_MARGIN: i32 = 10;
/// Minimum length of the whole lifeline, top box included.
const MIN_HEIGHT: i32 = 120;
/// Length of the line below the lowest call.
const TAIL: i32 = 20;
/// Distance between a constructor call and the top of the box it creates.
const CREATION_OFFSET: i32 = 20;

#[derive(Debug, Clone, Copy, Default)]
pub struct LifelineRenderer;

impl LifelineRenderer {
    /// The box at the top of the lifeline.
    pub fn top_rectangle(
        ctx: &DiagramRenderer<'_>,
        lifeline: NodeId,
    ) -> Result<Rectangle, ModelError> {
        let node = ctx.node_of_kind(lifeline, NodeKind::ImplicitParameter)?;
        let name = ctx.metrics().measure(
            node.name(),
            Alignment::CenterCenter,
            TextDecorations::PADDED | TextDecorations::UNDERLINED,
        );
        let width = MIN_WIDTH.max(name.width() + 2 * NAME_MARGIN);
        let y = Self::top_y(ctx, lifeline)?;
        Ok(Rectangle::new(node.position().x(), y, width, TOP_HEIGHT))
    }

    fn top_y(ctx: &DiagramRenderer<'_>, lifeline: NodeId) -> Result<i32, ModelError> {
        let Some(&first) = ctx.diagram().node(lifeline)?.children().first() else {
            return Ok(0);
        };
        let flow = ctx.control_flow()?;
        if !flow.is_constructor_execution(first)? {
            return Ok(0);
        }
        match flow.caller_of(first)? {
            Some(creator) => {
                let _guard = ctx.enter()?;
                Ok(CallNodeRenderer::y(ctx, creator)? + CREATION_OFFSET)
            }
            None => Ok(0),
        }
    }
}

impl NodeRenderer for LifelineRenderer {
    fn compute_bounds(
        &self,
        ctx: &DiagramRenderer<'_>,
        node: NodeId,
    ) -> Result<Rectangle, ModelError> {
        let top = Self::top_rectangle(ctx, node)?;
        let mut bottom = top.y() + MIN_HEIGHT;
        for child in ctx.diagram().node(node)?.children() {
            bottom = bottom.max(ctx.node_bounds(*child)?.max_y() + TAIL);
        }
        trace!(node:% = node, top:% = top, bottom; "Lifeline bounds");
        Ok(Rectangle::new(top.x(), top.y(), top.width(), bottom - top.y()))
    }

    fn draw(
        &self,
        ctx: &DiagramRenderer<'_>,
        node: NodeId,
        output: &mut LayeredOutput,
    ) -> Result<(), ModelError> {
        let top = Self::top_rectangle(ctx, node)?;
        let bounds = self.bounds(ctx, node)?;
        let color = ctx.foreground_color();

        filled_rectangle(top, color, RenderLayer::Lifeline, output);
        output.add_to_layer(
            RenderLayer::Lifeline,
            Box::new(line(
                Point::new(top.center().x(), top.max_y()),
                Point::new(top.center().x(), bounds.max_y()),
                &StrokeDefinition::dashed(color, 1.0),
            )),
        );

        let name = ctx.diagram().node(node)?.name();
        if !name.is_empty() {
            output.add_to_layer(
                RenderLayer::Text,
                Box::new(text_element(
                    ctx.metrics(),
                    name,
                    top,
                    Alignment::CenterCenter,
                    TextDecorations::UNDERLINED,
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
        let bounds = self.bounds(ctx, node)?;
        let y = Self::top_rectangle(ctx, node)?.center().y();
        if direction == Direction::EAST {
            Ok(Point::new(bounds.max_x(), y))
        } else {
            Ok(Point::new(bounds.x(), y))
        }
    }
}
