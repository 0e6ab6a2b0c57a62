//! Note edges: dotted connectors between a note and what it annotates.

use tracery_core::{
    diagram::{EdgeId, EdgeKind, ModelError},
    draw::StrokeStyle,
    geometry::Direction,
};

use super::{Arrowhead, EdgePath, edge_of_kind};
use crate::render::{DiagramRenderer, EdgeRenderer};

#[derive(Debug, Clone, Copy, Default)]
pub struct NoteEdgeRenderer;

impl EdgeRenderer for NoteEdgeRenderer {
    fn path(&self, ctx: &DiagramRenderer<'_>, edge: EdgeId) -> Result<EdgePath, ModelError> {
        let data = edge_of_kind(ctx, edge, EdgeKind::Note)?;
        let start = ctx.node_bounds(data.start())?.center();
        let end = ctx.node_bounds(data.end())?.center();

        let from = ctx.connection_point(data.start(), Direction::between(start, end))?;
        let to = ctx.connection_point(data.end(), Direction::between(end, start))?;
        Ok(EdgePath::straight(
            from,
            to,
            StrokeStyle::Dotted,
            Arrowhead::None,
        ))
    }
}

#[cfg(test)]
mod tests {
    use tracery_core::{
        diagram::{Diagram, NodeKind},
        draw::MonospaceMetrics,
        geometry::Point,
    };

    use super::*;

    #[test]
    fn test_note_to_point() {
        let mut diagram = Diagram::new();
        let note = diagram.add_root_node(NodeKind::Note, Point::new(0, 0));
        let anchor = diagram.add_root_node(NodeKind::Point, Point::new(200, 20));
        let edge = diagram.connect(EdgeKind::Note, note, anchor).unwrap();
        let metrics = MonospaceMetrics::default();
        let renderer = DiagramRenderer::new(&diagram, &metrics);

        let path = NoteEdgeRenderer.path(&renderer, edge).unwrap();
        // The note is 60 by 40, so its center is level with the anchor.
        assert_eq!(path.start(), Point::new(60, 20));
        assert_eq!(path.end(), Point::new(200, 20));
        assert_eq!(path.style(), StrokeStyle::Dotted);
        assert!(renderer.contains(edge.into(), Point::new(100, 21)).unwrap());
    }
}
