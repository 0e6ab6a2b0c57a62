//! Return edges: dashed arrows from the bottom of a callee back to its caller.

use tracery_core::{
    diagram::{EdgeId, EdgeKind, ModelError},
    draw::StrokeStyle,
};

use super::{Arrowhead, EdgePath, edge_of_kind, facing_sides};
use crate::render::{DiagramRenderer, EdgeRenderer};

#[derive(Debug, Clone, Copy, Default)]
pub struct ReturnEdgeRenderer;

impl EdgeRenderer for ReturnEdgeRenderer {
    fn path(&self, ctx: &DiagramRenderer<'_>, edge: EdgeId) -> Result<EdgePath, ModelError> {
        let data = edge_of_kind(ctx, edge, EdgeKind::Return)?;
        let callee = ctx.node_bounds(data.start())?;
        let caller = ctx.node_bounds(data.end())?;

        let (from, to) = facing_sides(callee, caller, callee.max_y());
        Ok(EdgePath::straight(
            from,
            to,
            StrokeStyle::Dashed,
            Arrowhead::Open,
        ))
    }
}
