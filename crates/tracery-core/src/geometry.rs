//! Geometric primitives for diagram layout and hit-testing.
//!
//! This module provides the geometric types used throughout Tracery to
//! describe where diagram elements are and how edges attach to them.
//!
//! # Overview
//!
//! - [`Point`] - A 2D integer coordinate in diagram space
//! - [`Dimension`] - Integer width and height
//! - [`Rectangle`] - An immutable axis-aligned rectangle anchored at its top-left corner
//! - [`Direction`] - A unit vector used to pick connection points on node boundaries
//!
//! # Coordinate System
//!
//! Tracery uses a coordinate system consistent with SVG:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! Coordinates are integers. Layout is computed exclusively with integer
//! arithmetic so that recomputing bounds for the same diagram state always
//! yields bit-identical rectangles, including after a save/reload cycle.

use std::fmt;

/// A 2D point in diagram coordinate space.
///
/// # Examples
///
/// ```
/// # use tracery_core::geometry::Point;
/// let p = Point::new(10, 20);
/// assert_eq!(p.translated(5, -5), Point::new(15, 15));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    x: i32,
    y: i32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> i32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> i32 {
        self.y
    }

    /// Returns a copy of this point moved by the given offsets.
    pub fn translated(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Point) -> f32 {
        let dx = (other.x - self.x) as f32;
        let dy = (other.y - self.y) as f32;
        dx.hypot(dy)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Width and height of a measured or laid out element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Dimension {
    width: i32,
    height: i32,
}

impl Dimension {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn width(self) -> i32 {
        self.width
    }

    pub fn height(self) -> i32 {
        self.height
    }

    /// Returns a dimension that is large enough to hold both `self` and `other`.
    pub fn max(self, other: Dimension) -> Self {
        Self::new(self.width.max(other.width), self.height.max(other.height))
    }
}

/// An immutable axis-aligned rectangle.
///
/// Rectangles are anchored at their top-left corner. `max_x` and `max_y` are
/// the coordinates of the right and bottom edges.
///
/// # Examples
///
/// ```
/// # use tracery_core::geometry::{Point, Rectangle};
/// let r = Rectangle::new(10, 20, 16, 30);
/// assert_eq!(r.max_x(), 26);
/// assert_eq!(r.max_y(), 50);
/// assert!(r.contains(Point::new(10, 50)));
///
/// let union = r.add(Rectangle::new(0, 0, 5, 5));
/// assert_eq!(union, Rectangle::new(0, 0, 26, 50));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rectangle {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

impl Rectangle {
    /// Creates a rectangle from its top-left corner and size.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle from a top-left point and a dimension.
    pub fn from_origin(origin: Point, dimension: Dimension) -> Self {
        Self::new(
            origin.x(),
            origin.y(),
            dimension.width(),
            dimension.height(),
        )
    }

    /// A zero-area rectangle at the given point.
    ///
    /// Used as the result of bounds queries that cannot be answered because the
    /// diagram structure is inconsistent.
    pub fn degenerate(at: Point) -> Self {
        Self::new(at.x(), at.y(), 0, 0)
    }

    /// Smallest rectangle enclosing all the given points, or `None` if empty.
    pub fn bounding<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min_x, min_y, max_x, max_y) = points.fold(
            (first.x(), first.y(), first.x(), first.y()),
            |(min_x, min_y, max_x, max_y), p| {
                (
                    min_x.min(p.x()),
                    min_y.min(p.y()),
                    max_x.max(p.x()),
                    max_y.max(p.y()),
                )
            },
        );
        Some(Self::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    pub fn x(self) -> i32 {
        self.x
    }

    pub fn y(self) -> i32 {
        self.y
    }

    pub fn width(self) -> i32 {
        self.width
    }

    pub fn height(self) -> i32 {
        self.height
    }

    /// X coordinate of the right edge.
    pub fn max_x(self) -> i32 {
        self.x + self.width
    }

    /// Y coordinate of the bottom edge.
    pub fn max_y(self) -> i32 {
        self.y + self.height
    }

    /// Top-left corner.
    pub fn origin(self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Center point, rounded towards the origin.
    pub fn center(self) -> Point {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn dimension(self) -> Dimension {
        Dimension::new(self.width, self.height)
    }

    /// Returns `true` if the rectangle has no area.
    pub fn is_degenerate(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns `true` if `point` lies inside or on the border of this rectangle.
    pub fn contains(self, point: Point) -> bool {
        self.x <= point.x()
            && point.x() <= self.max_x()
            && self.y <= point.y()
            && point.y() <= self.max_y()
    }

    /// Returns `true` if `other` lies entirely inside this rectangle.
    pub fn contains_rectangle(self, other: Rectangle) -> bool {
        self.x <= other.x
            && self.y <= other.y
            && other.max_x() <= self.max_x()
            && other.max_y() <= self.max_y()
    }

    /// Smallest rectangle enclosing both `self` and `other`.
    pub fn add(self, other: Rectangle) -> Self {
        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max_x = self.max_x().max(other.max_x());
        let max_y = self.max_y().max(other.max_y());
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Smallest rectangle enclosing both `self` and `point`.
    pub fn add_point(self, point: Point) -> Self {
        self.add(Self::degenerate(point))
    }

    /// Returns a copy of this rectangle moved by the given offsets.
    pub fn translated(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Grows the rectangle by `amount` on every side.
    pub fn expanded(self, amount: i32) -> Self {
        Self::new(
            self.x - amount,
            self.y - amount,
            self.width + 2 * amount,
            self.height + 2 * amount,
        )
    }

    /// Point where a ray cast from the center in `direction` leaves this rectangle.
    pub fn boundary_point(self, direction: Direction) -> Point {
        let center = self.center();
        let (dx, dy) = (direction.dx(), direction.dy());
        if dx == 0.0 && dy == 0.0 {
            return center;
        }

        let half_width = self.width as f32 / 2.0;
        let half_height = self.height as f32 / 2.0;
        let tx = if dx != 0.0 {
            half_width / dx.abs()
        } else {
            f32::INFINITY
        };
        let ty = if dy != 0.0 {
            half_height / dy.abs()
        } else {
            f32::INFINITY
        };
        let t = tx.min(ty);

        center.translated((dx * t).round() as i32, (dy * t).round() as i32)
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[x={}, y={}, w={}, h={}]",
            self.x, self.y, self.width, self.height
        )
    }
}

/// A unit vector describing a direction in diagram space.
///
/// Directions are used to ask a node for the point on its boundary that an
/// edge should attach to. The four cardinal directions are available as
/// associated constants.
///
/// # Examples
///
/// ```
/// # use tracery_core::geometry::{Direction, Point};
/// let d = Direction::between(Point::new(0, 0), Point::new(25, 0));
/// assert_eq!(d, Direction::EAST);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Direction {
    dx: f32,
    dy: f32,
}

impl Direction {
    pub const NORTH: Direction = Direction { dx: 0.0, dy: -1.0 };
    pub const EAST: Direction = Direction { dx: 1.0, dy: 0.0 };
    pub const SOUTH: Direction = Direction { dx: 0.0, dy: 1.0 };
    pub const WEST: Direction = Direction { dx: -1.0, dy: 0.0 };

    /// Creates a direction from a vector, normalizing it to unit length.
    ///
    /// A zero vector yields [`Direction::EAST`].
    pub fn new(dx: f32, dy: f32) -> Self {
        let length = dx.hypot(dy);
        if length == 0.0 {
            return Self::EAST;
        }
        Self {
            dx: dx / length,
            dy: dy / length,
        }
    }

    /// Direction of the vector going from `from` to `to`.
    pub fn between(from: Point, to: Point) -> Self {
        Self::new((to.x() - from.x()) as f32, (to.y() - from.y()) as f32)
    }

    pub fn dx(self) -> f32 {
        self.dx
    }

    pub fn dy(self) -> f32 {
        self.dy
    }

    /// The opposite direction.
    pub fn reversed(self) -> Self {
        Self {
            dx: -self.dx,
            dy: -self.dy,
        }
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_rectangle_accessors() {
        let r = Rectangle::new(10, 20, 30, 40);
        assert_eq!(r.x(), 10);
        assert_eq!(r.y(), 20);
        assert_eq!(r.width(), 30);
        assert_eq!(r.height(), 40);
        assert_eq!(r.max_x(), 40);
        assert_eq!(r.max_y(), 60);
        assert_eq!(r.center(), Point::new(25, 40));
        assert_eq!(r.origin(), Point::new(10, 20));
    }

    #[test]
    fn test_rectangle_contains_is_inclusive() {
        let r = Rectangle::new(0, 0, 10, 10);
        assert!(r.contains(Point::new(0, 0)));
        assert!(r.contains(Point::new(10, 10)));
        assert!(r.contains(Point::new(5, 5)));
        assert!(!r.contains(Point::new(11, 5)));
        assert!(!r.contains(Point::new(5, -1)));
    }

    #[test]
    fn test_rectangle_add() {
        let a = Rectangle::new(0, 0, 10, 10);
        let b = Rectangle::new(20, -5, 5, 5);
        let union = a.add(b);
        assert_eq!(union, Rectangle::new(0, -5, 25, 15));
        assert!(union.contains_rectangle(a));
        assert!(union.contains_rectangle(b));
    }

    #[test]
    fn test_rectangle_bounding() {
        assert_eq!(Rectangle::bounding(Vec::new()), None);

        let points = [Point::new(5, 5), Point::new(-5, 10), Point::new(0, 0)];
        assert_eq!(
            Rectangle::bounding(points),
            Some(Rectangle::new(-5, 0, 10, 10))
        );
    }

    #[test]
    fn test_rectangle_degenerate() {
        let r = Rectangle::degenerate(Point::new(3, 4));
        assert!(r.is_degenerate());
        assert_eq!(r.origin(), Point::new(3, 4));
        assert!(!Rectangle::new(0, 0, 1, 1).is_degenerate());
    }

    #[test]
    fn test_rectangle_boundary_point_cardinal() {
        let r = Rectangle::new(0, 0, 100, 40);
        assert_eq!(r.boundary_point(Direction::EAST), Point::new(100, 20));
        assert_eq!(r.boundary_point(Direction::WEST), Point::new(0, 20));
        assert_eq!(r.boundary_point(Direction::NORTH), Point::new(50, 0));
        assert_eq!(r.boundary_point(Direction::SOUTH), Point::new(50, 40));
    }

    #[test]
    fn test_rectangle_boundary_point_diagonal() {
        let r = Rectangle::new(0, 0, 40, 40);
        let p = r.boundary_point(Direction::new(1.0, 1.0));
        assert_eq!(p, Point::new(40, 40));
    }

    #[test]
    fn test_direction_normalizes() {
        let d = Direction::new(3.0, 4.0);
        assert_approx_eq!(f32, d.dx(), 0.6);
        assert_approx_eq!(f32, d.dy(), 0.8);
        assert_eq!(Direction::new(0.0, 0.0), Direction::EAST);
        assert_eq!(Direction::EAST.reversed(), Direction::WEST);
    }

    #[test]
    fn test_direction_between() {
        assert_eq!(
            Direction::between(Point::new(10, 10), Point::new(10, -50)),
            Direction::NORTH
        );
        assert_eq!(
            Direction::between(Point::new(10, 10), Point::new(-20, 10)),
            Direction::WEST
        );
    }

    #[test]
    fn test_point_distance() {
        assert_approx_eq!(f32, Point::new(0, 0).distance(Point::new(3, 4)), 5.0);
    }
}
