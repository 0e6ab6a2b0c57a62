//! Constructor edges: calls that create the lifeline they point to.

use tracery_core::{
    diagram::{EdgeId, EdgeKind, ModelError},
    draw::StrokeStyle,
};

use super::{Arrowhead, EdgePath, edge_of_kind, facing_sides};
use crate::render::{DiagramRenderer, EdgeRenderer, LifelineRenderer};

#[derive(Debug, Clone, Copy, Default)]
pub struct ConstructorEdgeRenderer;

impl EdgeRenderer for ConstructorEdgeRenderer {
    /// A horizontal arrow into the side of the created object's top box.
    fn path(&self, ctx: &DiagramRenderer<'_>, edge: EdgeId) -> Result<EdgePath, ModelError> {
        let data = edge_of_kind(ctx, edge, EdgeKind::Constructor)?;
        let creator = ctx.node_bounds(data.start())?;
        let created = ctx
            .diagram()
            .node(data.end())?
            .parent()
            .ok_or_else(|| {
                ModelError::Structure(format!(
                    "{edge} constructs a call outside of any lifeline"
                ))
            })?;
        let top = LifelineRenderer::top_rectangle(ctx, created)?;

        let (from, to) = facing_sides(creator, top, top.center().y());
        Ok(EdgePath::straight(
            from,
            to,
            StrokeStyle::Solid,
            Arrowhead::Filled,
        ))
    }
}
