//! Drawing surface for diagram elements.
//!
//! Renderers never write SVG documents directly. They build SVG elements with
//! the primitives in this module and collect them in a [`LayeredOutput`],
//! which takes care of z-ordering.
//!
//! All primitives take integer geometry; no coordinate is ever computed while
//! drawing.

mod layer;
mod stroke;
mod text;

pub use layer::{LayeredOutput, RenderLayer, SvgNode};
pub use stroke::{StrokeDefinition, StrokeStyle};
pub use text::{
    Alignment, FontMetrics, HORIZONTAL_PADDING, MonospaceMetrics, TextDecorations, TextMeasure,
    VERTICAL_PADDING, text_element,
};

use svg::node::element as svg_element;

use crate::{
    apply_stroke,
    color::Color,
    geometry::{Point, Rectangle},
};

/// Side length of the square selection handles.
const HANDLE_SIZE: i32 = 6;

/// An outlined rectangle, filled with `fill` or left transparent.
pub fn rectangle(
    bounds: Rectangle,
    stroke: &StrokeDefinition,
    fill: Option<Color>,
) -> svg_element::Rectangle {
    let element = svg_element::Rectangle::new()
        .set("x", bounds.x())
        .set("y", bounds.y())
        .set("width", bounds.width())
        .set("height", bounds.height());
    let element = match fill {
        Some(color) => element
            .set("fill", color.to_string())
            .set("fill-opacity", color.alpha()),
        None => element.set("fill", "none"),
    };
    apply_stroke!(element, stroke)
}

/// A straight line segment.
pub fn line(from: Point, to: Point, stroke: &StrokeDefinition) -> svg_element::Line {
    let element = svg_element::Line::new()
        .set("x1", from.x())
        .set("y1", from.y())
        .set("x2", to.x())
        .set("y2", to.y());
    apply_stroke!(element, stroke)
}

/// An open polyline through `points`.
pub fn polyline(points: &[Point], stroke: &StrokeDefinition) -> svg_element::Polyline {
    let coordinates = points
        .iter()
        .map(|p| format!("{},{}", p.x(), p.y()))
        .collect::<Vec<_>>()
        .join(" ");
    let element = svg_element::Polyline::new()
        .set("points", coordinates)
        .set("fill", "none");
    apply_stroke!(element, stroke)
}

/// A closed, filled polygon.
pub fn polygon(points: &[Point], stroke: &StrokeDefinition, fill: Color) -> svg_element::Polygon {
    let coordinates = points
        .iter()
        .map(|p| format!("{},{}", p.x(), p.y()))
        .collect::<Vec<_>>()
        .join(" ");
    let element = svg_element::Polygon::new()
        .set("points", coordinates)
        .set("fill", fill.to_string())
        .set("fill-opacity", fill.alpha());
    apply_stroke!(element, stroke)
}

/// Small filled squares on the four corners of `bounds`, on the
/// [`RenderLayer::Selection`] layer.
pub fn selection_handles(bounds: Rectangle, color: Color, output: &mut LayeredOutput) {
    let corners = [
        bounds.origin(),
        Point::new(bounds.max_x(), bounds.y()),
        Point::new(bounds.x(), bounds.max_y()),
        Point::new(bounds.max_x(), bounds.max_y()),
    ];
    for corner in corners {
        selection_handle(corner, color, output);
    }
}

/// One selection handle centered on `at`.
pub fn selection_handle(at: Point, color: Color, output: &mut LayeredOutput) {
    let handle = Rectangle::new(
        at.x() - HANDLE_SIZE / 2,
        at.y() - HANDLE_SIZE / 2,
        HANDLE_SIZE,
        HANDLE_SIZE,
    );
    output.add_to_layer(
        RenderLayer::Selection,
        Box::new(rectangle(handle, &StrokeDefinition::solid(color, 1.0), Some(color))),
    );
}
