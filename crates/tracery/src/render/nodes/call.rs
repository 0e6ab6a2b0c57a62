//! Call nodes (activation boxes).
//!
//! The geometry of a call is driven by two walks over the call tree:
//!
//! - [`CallNodeRenderer::y`] walks *up*, from a call to its caller, until it
//!   reaches the top box of a lifeline. A later callee is placed by stepping
//!   forward through the siblings before it.
//! - [`CallNodeRenderer::max_y`] walks *down* through the callees of a call,
//!   stacking them one below the other.
//!
//! Recursion only follows the caller chain, so its depth is the nesting depth
//! of a call, not the number of calls its caller makes.

use log::trace;

use tracery_core::{
    color::Color,
    diagram::{ModelError, NodeId, NodeKind},
    draw::{
        Alignment, LayeredOutput, RenderLayer, StrokeDefinition, TextDecorations, line, polyline,
        rectangle,
    },
    geometry::{Direction, Point, Rectangle},
};

use super::LifelineRenderer;
use crate::render::{DiagramRenderer, NodeRenderer, filled_rectangle};

/// Width of every activation box.
pub const WIDTH: i32 = 16;
/// Height of a call that makes no calls.
pub const DEFAULT_HEIGHT: i32 = 30;
/// Gap between a caller's top and its first nested callee.
pub const Y_GAP_BIG: i32 = 20;
/// Gap between siblings, and between a caller's top and a first callee on another lifeline.
pub const Y_GAP_SMALL: i32 = 20;
/// Gap between the top box of a created object and its constructor activation.
pub const Y_GAP_TINY: i32 = 5;
/// Shifts smaller than this are dropped.
const MINIMUM_SHIFT_THRESHOLD: i32 = 10;
/// Length of the dashed part of an open-bottom activation.
const OPEN_BOTTOM_GAP: i32 = 20;
/// Glyph whose padded height sets the font-dependent shift.
const SHIFT_SAMPLE: &str = "|";

#[derive(Debug, Clone, Copy, Default)]
pub struct CallNodeRenderer;

/// What the top of a call is placed relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallTop {
    /// First activation of an object created by a constructor call.
    ConstructorExecution(NodeId),
    /// First callee: placed below the top of its caller.
    AfterCallerTop { caller: NodeId, gap: i32 },
    /// Later callee: placed below the bottom of the previous one.
    AfterPreviousCallee { caller: NodeId },
    /// Not called by anything: placed below the top box of its lifeline.
    LifelineStart(NodeId),
    /// Not inside a lifeline.
    Detached,
}

impl CallNodeRenderer {
    /// Top of `call`.
    pub fn y(ctx: &DiagramRenderer<'_>, call: NodeId) -> Result<i32, ModelError> {
        if let Some(bounds) = ctx.storage().peek(call) {
            return Ok(bounds.y());
        }
        let _guard = ctx.enter()?;

        let y = match Self::top_rule(ctx, call)? {
            CallTop::Detached => {
                trace!(call:% = call; "Call outside a lifeline placed at the origin");
                return Ok(0);
            }
            CallTop::ConstructorExecution(lifeline) => {
                LifelineRenderer::top_rectangle(ctx, lifeline)?.max_y() + Y_GAP_TINY
            }
            CallTop::AfterCallerTop { caller, gap } => Self::y(ctx, caller)? + gap,
            CallTop::AfterPreviousCallee { caller } => {
                return Self::later_callee_y(ctx, caller, call);
            }
            CallTop::LifelineStart(lifeline) => {
                LifelineRenderer::top_rectangle(ctx, lifeline)?.max_y() + Y_GAP_SMALL
            }
        };
        Ok(y + Self::shift(ctx))
    }

    /// Bottom of `call`.
    pub fn max_y(ctx: &DiagramRenderer<'_>, call: NodeId) -> Result<i32, ModelError> {
        if let Some(bounds) = ctx.storage().peek(call) {
            return Ok(bounds.max_y());
        }
        let top = Self::y(ctx, call)?;
        Self::bottom_below(ctx, call, top)
    }

    /// Bottom of `call` when its top is `top`: the bottom of its last callee
    /// plus a gap, or the default height for a call that makes no calls.
    fn bottom_below(
        ctx: &DiagramRenderer<'_>,
        call: NodeId,
        top: i32,
    ) -> Result<i32, ModelError> {
        if let Some(bounds) = ctx.storage().peek(call) {
            return Ok(bounds.max_y());
        }
        let _guard = ctx.enter()?;

        let flow = ctx.control_flow()?;
        let callees = flow.callees_of(call)?;
        let Some((&first, rest)) = callees.split_first() else {
            return Ok(top + DEFAULT_HEIGHT);
        };
        let shift = Self::shift(ctx);
        let gap = if flow.is_nested(first)? {
            Y_GAP_BIG
        } else {
            Y_GAP_SMALL
        };

        let mut callee_top = Self::placed_top(ctx, first, top + gap + shift)?;
        let mut bottom = Self::bottom_below(ctx, first, callee_top)?;
        for &callee in rest {
            callee_top = Self::placed_top(ctx, callee, bottom + Y_GAP_SMALL + shift)?;
            bottom = Self::bottom_below(ctx, callee, callee_top)?;
        }
        Ok(bottom + Y_GAP_SMALL)
    }

    /// Top of a callee that is not its caller's first, found by stepping
    /// forward from the nearest earlier sibling whose bounds are known.
    fn later_callee_y(
        ctx: &DiagramRenderer<'_>,
        caller: NodeId,
        call: NodeId,
    ) -> Result<i32, ModelError> {
        let flow = ctx.control_flow()?;
        let siblings = flow.callees_of(caller)?;
        let index = siblings
            .iter()
            .position(|sibling| *sibling == call)
            .ok_or_else(|| {
                ModelError::Structure(format!("{call} is not among the callees of {caller}"))
            })?;
        let start = siblings[..index]
            .iter()
            .rposition(|sibling| ctx.storage().peek(*sibling).is_some())
            .unwrap_or(0);

        let shift = Self::shift(ctx);
        let mut top = Self::y(ctx, siblings[start])?;
        for pair in siblings[start..=index].windows(2) {
            let bottom = Self::bottom_below(ctx, pair[0], top)?;
            top = Self::placed_top(ctx, pair[1], bottom + Y_GAP_SMALL + shift)?;
        }
        Ok(top)
    }

    /// Top of a callee whose place in its caller's sequence is `in_sequence`,
    /// unless its lifeline or the lack of one decides it.
    fn placed_top(
        ctx: &DiagramRenderer<'_>,
        callee: NodeId,
        in_sequence: i32,
    ) -> Result<i32, ModelError> {
        let detached = ctx.node_of_kind(callee, NodeKind::Call)?.parent().is_none();
        if detached || ctx.control_flow()?.is_constructor_execution(callee)? {
            Self::y(ctx, callee)
        } else {
            Ok(in_sequence)
        }
    }

    /// Left edge of `call`, cascading right with the nesting depth.
    fn x(ctx: &DiagramRenderer<'_>, call: NodeId) -> Result<i32, ModelError> {
        let Some(lifeline) = ctx.node_of_kind(call, NodeKind::Call)?.parent() else {
            return Ok(0);
        };
        let depth = ctx.control_flow()?.nesting_depth(call)? as i32;
        let center = LifelineRenderer::top_rectangle(ctx, lifeline)?.center().x();
        Ok(center - WIDTH / 2 + depth * WIDTH / 2)
    }

    /// Extra vertical room for large fonts, so that call tops clear edge labels.
    fn shift(ctx: &DiagramRenderer<'_>) -> i32 {
        let bar = ctx
            .metrics()
            .measure(SHIFT_SAMPLE, Alignment::CenterCenter, TextDecorations::PADDED);
        let shift = bar.height() / 3;
        if shift < MINIMUM_SHIFT_THRESHOLD { 0 } else { shift }
    }

    fn top_rule(ctx: &DiagramRenderer<'_>, call: NodeId) -> Result<CallTop, ModelError> {
        let node = ctx.node_of_kind(call, NodeKind::Call)?;
        let flow = ctx.control_flow()?;

        let Some(lifeline) = node.parent() else {
            return Ok(CallTop::Detached);
        };
        if flow.is_constructor_execution(call)? {
            return Ok(CallTop::ConstructorExecution(lifeline));
        }
        let Some(caller) = flow.caller_of(call)? else {
            return Ok(CallTop::LifelineStart(lifeline));
        };

        if !flow.is_first_callee(call)? {
            return Ok(CallTop::AfterPreviousCallee { caller });
        }
        let gap = if flow.is_nested(call)? {
            Y_GAP_BIG
        } else {
            Y_GAP_SMALL
        };
        Ok(CallTop::AfterCallerTop { caller, gap })
    }
}

impl NodeRenderer for CallNodeRenderer {
    fn compute_bounds(
        &self,
        ctx: &DiagramRenderer<'_>,
        node: NodeId,
    ) -> Result<Rectangle, ModelError> {
        if ctx.node_of_kind(node, NodeKind::Call)?.parent().is_none() {
            return Err(ModelError::Structure(format!(
                "{node} is a call outside of any lifeline"
            )));
        }
        let y = Self::y(ctx, node)?;
        let max_y = Self::bottom_below(ctx, node, y)?;
        let bounds = Rectangle::new(Self::x(ctx, node)?, y, WIDTH, max_y - y);
        trace!(node:% = node, bounds:% = bounds; "Call bounds computed");
        Ok(bounds)
    }

    fn draw(
        &self,
        ctx: &DiagramRenderer<'_>,
        node: NodeId,
        output: &mut LayeredOutput,
    ) -> Result<(), ModelError> {
        let bounds = self.bounds(ctx, node)?;
        let color = ctx.foreground_color();
        if !ctx.diagram().node(node)?.is_open_bottom() {
            filled_rectangle(bounds, color, RenderLayer::Activation, output);
            return Ok(());
        }

        let white = Color::new("white").unwrap_or_default();
        output.add_to_layer(
            RenderLayer::Activation,
            Box::new(rectangle(
                bounds,
                &StrokeDefinition::solid(white, 0.0),
                Some(white),
            )),
        );

        let split = (bounds.max_y() - OPEN_BOTTOM_GAP).max(bounds.y());
        let solid = [
            Point::new(bounds.x(), split),
            bounds.origin(),
            Point::new(bounds.max_x(), bounds.y()),
            Point::new(bounds.max_x(), split),
        ];
        output.add_to_layer(
            RenderLayer::Activation,
            Box::new(polyline(&solid, &StrokeDefinition::solid(color, 1.0))),
        );
        for x in [bounds.x(), bounds.max_x()] {
            output.add_to_layer(
                RenderLayer::Activation,
                Box::new(line(
                    Point::new(x, split),
                    Point::new(x, bounds.max_y()),
                    &StrokeDefinition::dashed(color, 1.0),
                )),
            );
        }
        Ok(())
    }

    /// Calls enter on the top-left corner and return from the top-right one.
    fn connection_point(
        &self,
        ctx: &DiagramRenderer<'_>,
        node: NodeId,
        direction: Direction,
    ) -> Result<Point, ModelError> {
        let bounds = self.bounds(ctx, node)?;
        if direction == Direction::EAST {
            Ok(Point::new(bounds.max_x(), bounds.y()))
        } else {
            Ok(bounds.origin())
        }
    }
}
