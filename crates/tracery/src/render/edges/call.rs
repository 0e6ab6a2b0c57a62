//! Call edges.
//!
//! A call to another lifeline is a horizontal arrow at the top of the callee.
//! A nested call on the same lifeline loops out to the right and back into the
//! callee.

use tracery_core::{
    diagram::{EdgeId, EdgeKind, ModelError, keys},
    draw::StrokeStyle,
    geometry::Point,
};

use super::{Arrowhead, EdgePath, edge_of_kind, facing_sides};
use crate::render::{DiagramRenderer, EdgeRenderer};

/// Height of the loop of a nested call, above the callee's top.
const LOOP_RISE: i32 = 10;
/// Width of the loop of a nested call, right of the callee.
const LOOP_REACH: i32 = 20;

#[derive(Debug, Clone, Copy, Default)]
pub struct CallEdgeRenderer;

impl EdgeRenderer for CallEdgeRenderer {
    fn path(&self, ctx: &DiagramRenderer<'_>, edge: EdgeId) -> Result<EdgePath, ModelError> {
        let data = edge_of_kind(ctx, edge, EdgeKind::Call)?;
        let caller = ctx.node_bounds(data.start())?;
        let callee = ctx.node_bounds(data.end())?;
        let arrowhead = if data.properties().get_bool(keys::SIGNAL).unwrap_or(false) {
            Arrowhead::Open
        } else {
            Arrowhead::Filled
        };

        let diagram = ctx.diagram();
        let lifeline = diagram.node(data.end())?.parent();
        let y = callee.y();
        if lifeline.is_some() && lifeline == diagram.node(data.start())?.parent() {
            let top = y - LOOP_RISE;
            let reach = callee.max_x() + LOOP_REACH;
            return Ok(EdgePath::new(
                vec![
                    Point::new(caller.max_x(), top),
                    Point::new(reach, top),
                    Point::new(reach, y),
                    Point::new(callee.max_x(), y),
                ],
                StrokeStyle::Solid,
                arrowhead,
            ));
        }

        let (from, to) = facing_sides(caller, callee, y);
        Ok(EdgePath::straight(from, to, StrokeStyle::Solid, arrowhead))
    }
}
