//! Edge renderers and the path geometry they share.
//!
//! An edge renderer only decides *where* the edge runs; bounds, hit-testing
//! and drawing are derived from the resulting [`EdgePath`].

mod call;
mod constructor;
mod note;
mod ret;

pub use call::CallEdgeRenderer;
pub use constructor::ConstructorEdgeRenderer;
pub use note::NoteEdgeRenderer;
pub use ret::ReturnEdgeRenderer;

use tracery_core::{
    color::Color,
    diagram::{Edge, EdgeId, EdgeKind, ModelError},
    draw::{
        Alignment, LayeredOutput, RenderLayer, StrokeDefinition, StrokeStyle, TextDecorations,
        TextMeasure, polygon, polyline, text_element,
    },
    geometry::{Point, Rectangle},
};

use crate::render::DiagramRenderer;

/// Maximum distance between a point and a segment for the point to hit it.
const HIT_TOLERANCE: f32 = 3.0;
const ARROW_LENGTH: f32 = 10.0;
const ARROW_HALF_WIDTH: f32 = 5.0;

/// Decoration at the end of an edge path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Arrowhead {
    #[default]
    None,
    /// Closed, filled triangle (synchronous calls).
    Filled,
    /// Two open strokes (signals, returns).
    Open,
}

/// The polyline an edge is drawn along.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgePath {
    points: Vec<Point>,
    style: StrokeStyle,
    arrowhead: Arrowhead,
}

impl EdgePath {
    /// Creates a path through `points`, which must hold at least two points.
    pub fn new(points: Vec<Point>, style: StrokeStyle, arrowhead: Arrowhead) -> Self {
        debug_assert!(points.len() >= 2, "an edge path needs two points");
        Self {
            points,
            style,
            arrowhead,
        }
    }

    /// A straight path from `from` to `to`.
    pub fn straight(from: Point, to: Point, style: StrokeStyle, arrowhead: Arrowhead) -> Self {
        Self::new(vec![from, to], style, arrowhead)
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn style(&self) -> StrokeStyle {
        self.style
    }

    pub fn arrowhead(&self) -> Arrowhead {
        self.arrowhead
    }

    pub fn start(&self) -> Point {
        self.points.first().copied().unwrap_or_default()
    }

    pub fn end(&self) -> Point {
        self.points.last().copied().unwrap_or_default()
    }

    /// Bounding box of the path's points.
    pub fn bounds(&self) -> Rectangle {
        Rectangle::bounding(self.points.iter().copied()).unwrap_or_default()
    }

    /// Area of the middle label: centered on, and resting above, the middle
    /// of the middle segment. `None` for an empty label.
    pub fn label_bounds(&self, metrics: &dyn TextMeasure, label: &str) -> Option<Rectangle> {
        if label.is_empty() {
            return None;
        }
        let size = metrics.measure(label, Alignment::CenterCenter, TextDecorations::PADDED);
        let middle = self.middle();
        Some(Rectangle::new(
            middle.x() - size.width() / 2,
            middle.y() - size.height(),
            size.width(),
            size.height(),
        ))
    }

    /// Returns `true` if `point` is within a few units of any segment.
    pub fn is_near(&self, point: Point) -> bool {
        self.points
            .windows(2)
            .any(|segment| segment_distance(point, segment[0], segment[1]) <= HIT_TOLERANCE)
    }

    /// Draws the path, its arrowhead and its label.
    pub fn draw(
        &self,
        metrics: &dyn TextMeasure,
        label: &str,
        color: Color,
        output: &mut LayeredOutput,
    ) {
        let stroke = StrokeDefinition::solid(color, 1.0).with_style(self.style);
        output.add_to_layer(RenderLayer::Edge, Box::new(polyline(&self.points, &stroke)));

        if let Some(head) = self.arrowhead_points() {
            let solid = StrokeDefinition::solid(color, 1.0);
            match self.arrowhead {
                Arrowhead::Filled => output.add_to_layer(
                    RenderLayer::Edge,
                    Box::new(polygon(&head, &solid, color)),
                ),
                Arrowhead::Open => output.add_to_layer(
                    RenderLayer::Edge,
                    Box::new(polyline(&[head[1], head[0], head[2]], &solid)),
                ),
                Arrowhead::None => {}
            }
        }

        if let Some(area) = self.label_bounds(metrics, label) {
            output.add_to_layer(
                RenderLayer::Text,
                Box::new(text_element(
                    metrics,
                    label,
                    area,
                    Alignment::CenterCenter,
                    TextDecorations::PADDED,
                    Some(color),
                )),
            );
        }
    }

    /// Midpoint of the middle segment.
    fn middle(&self) -> Point {
        let segment = self.points.len().saturating_sub(2) / 2;
        match (self.points.get(segment), self.points.get(segment + 1)) {
            (Some(from), Some(to)) => Point::new((from.x() + to.x()) / 2, (from.y() + to.y()) / 2),
            _ => self.start(),
        }
    }

    /// Tip and the two barbs of the arrowhead, or `None` for a headless or
    /// zero-length final segment.
    fn arrowhead_points(&self) -> Option<[Point; 3]> {
        if self.arrowhead == Arrowhead::None {
            return None;
        }
        let [.., from, tip] = self.points.as_slice() else {
            return None;
        };
        let (dx, dy) = ((tip.x() - from.x()) as f32, (tip.y() - from.y()) as f32);
        let length = dx.hypot(dy);
        if length == 0.0 {
            return None;
        }
        let (ux, uy) = (dx / length, dy / length);
        let base_x = tip.x() as f32 - ux * ARROW_LENGTH;
        let base_y = tip.y() as f32 - uy * ARROW_LENGTH;
        let barb = |side: f32| {
            Point::new(
                (base_x - uy * ARROW_HALF_WIDTH * side).round() as i32,
                (base_y + ux * ARROW_HALF_WIDTH * side).round() as i32,
            )
        };
        Some([*tip, barb(1.0), barb(-1.0)])
    }
}

/// Distance from `point` to the segment between `a` and `b`.
fn segment_distance(point: Point, a: Point, b: Point) -> f32 {
    let (px, py) = (point.x() as f32, point.y() as f32);
    let (ax, ay) = (a.x() as f32, a.y() as f32);
    let (bx, by) = (b.x() as f32, b.y() as f32);
    let (dx, dy) = (bx - ax, by - ay);
    let length_squared = dx * dx + dy * dy;
    let t = if length_squared == 0.0 {
        0.0
    } else {
        (((px - ax) * dx + (py - ay) * dy) / length_squared).clamp(0.0, 1.0)
    };
    (px - (ax + t * dx)).hypot(py - (ay + t * dy))
}

/// Returns the edge for `id` if it is of `kind`.
fn edge_of_kind<'a>(
    ctx: &DiagramRenderer<'a>,
    id: EdgeId,
    kind: EdgeKind,
) -> Result<&'a Edge, ModelError> {
    let edge = ctx.diagram().edge(id)?;
    if edge.kind() != kind {
        return Err(ModelError::Precondition(format!(
            "{id} is a {}, expected a {kind}",
            edge.kind()
        )));
    }
    Ok(edge)
}

/// Endpoints of a horizontal segment at `y` joining two boxes, from the side of
/// `from` that faces `to` to the side of `to` that faces `from`.
fn facing_sides(from: Rectangle, to: Rectangle, y: i32) -> (Point, Point) {
    if to.center().x() >= from.center().x() {
        (Point::new(from.max_x(), y), Point::new(to.x(), y))
    } else {
        (Point::new(from.x(), y), Point::new(to.max_x(), y))
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;
    use tracery_core::draw::MonospaceMetrics;

    use super::*;

    fn horizontal() -> EdgePath {
        EdgePath::straight(
            Point::new(0, 50),
            Point::new(100, 50),
            StrokeStyle::Solid,
            Arrowhead::Filled,
        )
    }

    #[test]
    fn test_bounds_and_ends() {
        let path = EdgePath::new(
            vec![Point::new(10, 0), Point::new(30, 0), Point::new(30, 10)],
            StrokeStyle::Solid,
            Arrowhead::None,
        );
        assert_eq!(path.start(), Point::new(10, 0));
        assert_eq!(path.end(), Point::new(30, 10));
        assert_eq!(path.bounds(), Rectangle::new(10, 0, 20, 10));
    }

    #[test]
    fn test_label_rests_above_middle() {
        let metrics = MonospaceMetrics::default();
        let area = horizontal().label_bounds(&metrics, "call()").unwrap();
        // Six glyphs of 7 units plus padding; one line of 16 plus padding.
        assert_eq!(area.width(), 6 * 7 + 14);
        assert_eq!(area.height(), 16 + 12);
        assert_eq!(area.max_y(), 50);
        assert_eq!(area.center().x(), 50);

        assert_eq!(horizontal().label_bounds(&metrics, ""), None);
    }

    #[test]
    fn test_is_near() {
        let path = horizontal();
        assert!(path.is_near(Point::new(50, 52)));
        assert!(path.is_near(Point::new(102, 50)));
        assert!(!path.is_near(Point::new(50, 55)));
        assert!(!path.is_near(Point::new(105, 50)));
    }

    #[test]
    fn test_segment_distance() {
        let d = segment_distance(Point::new(5, 5), Point::new(0, 0), Point::new(10, 0));
        assert!(approx_eq!(f32, d, 5.0, ulps = 2));
        let d = segment_distance(Point::new(3, 4), Point::new(0, 0), Point::new(0, 0));
        assert!(approx_eq!(f32, d, 5.0, ulps = 2));
    }

    #[test]
    fn test_arrowhead_points_back_along_last_segment() {
        let [tip, left, right] = horizontal().arrowhead_points().unwrap();
        assert_eq!(tip, Point::new(100, 50));
        assert_eq!(left, Point::new(90, 55));
        assert_eq!(right, Point::new(90, 45));
    }

    #[test]
    fn test_draw_layers() {
        let metrics = MonospaceMetrics::default();
        let mut output = LayeredOutput::new();
        horizontal().draw(&metrics, "call()", Color::default(), &mut output);
        // Line, arrowhead and label.
        assert_eq!(output.len(), 3);

        let mut output = LayeredOutput::new();
        EdgePath::straight(
            Point::new(0, 0),
            Point::new(10, 0),
            StrokeStyle::Dotted,
            Arrowhead::None,
        )
        .draw(&metrics, "", Color::default(), &mut output);
        assert_eq!(output.len(), 1);
    }

    #[test]
    fn test_facing_sides() {
        let left = Rectangle::new(0, 0, 16, 30);
        let right = Rectangle::new(100, 0, 16, 30);
        assert_eq!(
            facing_sides(left, right, 5),
            (Point::new(16, 5), Point::new(100, 5))
        );
        assert_eq!(
            facing_sides(right, left, 5),
            (Point::new(100, 5), Point::new(16, 5))
        );
    }
}
