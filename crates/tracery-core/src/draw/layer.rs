//! Z-ordered collection of SVG output.
//!
//! Elements are drawn in diagram order, which is not the order in which they
//! must be stacked: an activation drawn before the lifeline it sits on would
//! otherwise be hidden by it. Renderers therefore tag every SVG node with a
//! [`RenderLayer`], and [`LayeredOutput::render`] emits one `<g>` group per
//! layer from bottom to top.
//!
//! ```
//! # use tracery_core::draw::{LayeredOutput, RenderLayer};
//! # use svg::node::element::{Line, Rectangle};
//! let mut output = LayeredOutput::new();
//! output.add_to_layer(RenderLayer::Activation, Box::new(Rectangle::new()));
//! output.add_to_layer(RenderLayer::Lifeline, Box::new(Line::new()));
//!
//! let groups = output.render();
//! assert_eq!(groups.len(), 2);
//! ```

use svg::node::element as svg_element;

/// Type alias for boxed SVG nodes.
pub type SvgNode = Box<dyn svg::Node>;

/// Rendering layers, bottom first.
///
/// The derived `Ord` follows declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderLayer {
    Background,
    /// Lifeline boxes and their dashed time lines.
    Lifeline,
    /// Call node rectangles.
    Activation,
    Note,
    /// Call, return, constructor and note edges.
    Edge,
    Text,
    /// Selection handles, always on top.
    Selection,
}

impl RenderLayer {
    /// Value of the `data-layer` attribute of the layer group.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Lifeline => "lifeline",
            Self::Activation => "activation",
            Self::Note => "note",
            Self::Edge => "edge",
            Self::Text => "text",
            Self::Selection => "selection",
        }
    }
}

/// SVG nodes grouped by rendering layer.
#[derive(Debug, Default)]
pub struct LayeredOutput {
    items: Vec<(RenderLayer, SvgNode)>,
}

impl LayeredOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `node` to `layer`. Nodes keep their insertion order within a layer.
    pub fn add_to_layer(&mut self, layer: RenderLayer, node: SvgNode) {
        self.items.push((layer, node));
    }

    /// Moves every node of `other` into this output.
    pub fn merge(&mut self, other: LayeredOutput) {
        self.items.extend(other.items);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of nodes across all layers.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Renders all layers to SVG groups, consuming the output.
    ///
    /// Each non-empty layer becomes a `<g data-layer="...">` element. Empty
    /// layers are skipped.
    pub fn render(mut self) -> Vec<SvgNode> {
        // Stable: keeps drawing order inside each layer.
        self.items.sort_by_key(|(layer, _)| *layer);

        let mut result: Vec<SvgNode> = Vec::new();
        let mut current: Option<(RenderLayer, svg_element::Group)> = None;

        for (layer, node) in self.items {
            current = match current {
                Some((current_layer, group)) if current_layer == layer => {
                    Some((layer, group.add(node)))
                }
                previous => {
                    if let Some((_, group)) = previous {
                        result.push(Box::new(group));
                    }
                    let group = svg_element::Group::new().set("data-layer", layer.name());
                    Some((layer, group.add(node)))
                }
            };
        }

        if let Some((_, group)) = current {
            result.push(Box::new(group));
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use svg::node::element::Rectangle;

    use super::*;

    #[test]
    fn test_layered_output_new_is_empty() {
        let output = LayeredOutput::new();
        assert!(output.is_empty());
        assert!(output.render().is_empty());
    }

    #[test]
    fn test_layered_output_merge() {
        let mut first = LayeredOutput::new();
        first.add_to_layer(RenderLayer::Activation, Box::new(Rectangle::new()));

        let mut second = LayeredOutput::new();
        second.add_to_layer(RenderLayer::Note, Box::new(Rectangle::new()));

        first.merge(second);
        assert_eq!(first.len(), 2);
        assert_eq!(first.render().len(), 2);
    }

    #[test]
    fn test_layered_output_same_layer_single_group() {
        let mut output = LayeredOutput::new();
        output.add_to_layer(RenderLayer::Edge, Box::new(Rectangle::new()));
        output.add_to_layer(RenderLayer::Edge, Box::new(Rectangle::new()));

        assert_eq!(output.render().len(), 1);
    }

    #[test]
    fn test_layered_output_renders_bottom_first() {
        let mut output = LayeredOutput::new();
        output.add_to_layer(RenderLayer::Text, Box::new(Rectangle::new()));
        output.add_to_layer(RenderLayer::Lifeline, Box::new(Rectangle::new()));

        let groups = output.render();
        let rendered: Vec<String> = groups.iter().map(|group| group.to_string()).collect();
        assert!(rendered[0].contains(r#"data-layer="lifeline""#));
        assert!(rendered[1].contains(r#"data-layer="text""#));
    }
}
