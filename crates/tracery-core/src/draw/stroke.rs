//! Stroke definitions for outlines and edge paths.
//!
//! Interaction diagrams only need three line patterns: solid outlines,
//! dashed lifelines and return edges, and dotted note connectors and
//! open-ended activations.
//!
//! ```
//! use tracery_core::color::Color;
//! use tracery_core::draw::{StrokeDefinition, StrokeStyle};
//! use svg::node::element as svg_element;
//!
//! let stroke = StrokeDefinition::dashed(Color::default(), 1.0);
//! assert_eq!(*stroke.style(), StrokeStyle::Dashed);
//!
//! let line = svg_element::Line::new().set("x1", 0).set("x2", 10);
//! let line = tracery_core::apply_stroke!(line, &stroke);
//! ```

use std::str::FromStr;

use crate::color::Color;

/// Line pattern of a stroke.
///
/// Maps to the SVG `stroke-dasharray` attribute; solid strokes emit none.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum StrokeStyle {
    #[default]
    Solid,
    /// 5px dash, 5px gap.
    Dashed,
    /// 2px dot, 3px gap.
    Dotted,
}

impl StrokeStyle {
    /// Returns the SVG dasharray value for this style, or `None` for solid lines.
    pub fn to_svg_value(self) -> Option<&'static str> {
        match self {
            Self::Solid => None,
            Self::Dashed => Some("5,5"),
            Self::Dotted => Some("2,3"),
        }
    }
}

impl FromStr for StrokeStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "solid" => Ok(Self::Solid),
            "dashed" => Ok(Self::Dashed),
            "dotted" => Ok(Self::Dotted),
            _ => Err(format!(
                "invalid stroke style `{s}`, valid values: solid, dashed, dotted"
            )),
        }
    }
}

/// Color, width and pattern of a line.
#[derive(Debug, Clone)]
pub struct StrokeDefinition {
    color: Color,
    width: f32,
    style: StrokeStyle,
}

impl StrokeDefinition {
    /// Creates a solid stroke.
    pub fn solid(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            style: StrokeStyle::Solid,
        }
    }

    /// Creates a dashed stroke.
    pub fn dashed(color: Color, width: f32) -> Self {
        Self::solid(color, width).with_style(StrokeStyle::Dashed)
    }

    /// Creates a dotted stroke.
    pub fn dotted(color: Color, width: f32) -> Self {
        Self::solid(color, width).with_style(StrokeStyle::Dotted)
    }

    /// Returns a copy of this stroke using `style`.
    pub fn with_style(mut self, style: StrokeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn style(&self) -> &StrokeStyle {
        &self.style
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }
}

impl Default for StrokeDefinition {
    fn default() -> Self {
        Self::solid(Color::default(), 1.0)
    }
}

/// Apply all stroke attributes to an SVG element.
///
/// Sets color, opacity and width, and the dash pattern when the stroke is not
/// solid. Elements drawn with this macro are never filled unless the caller
/// sets `fill` afterwards.
#[macro_export]
macro_rules! apply_stroke {
    ($element:expr, $stroke:expr) => {{
        let mut elem = $element
            .set("stroke", $stroke.color().to_string())
            .set("stroke-opacity", $stroke.color().alpha())
            .set("stroke-width", $stroke.width());

        if let Some(dasharray) = $stroke.style().to_svg_value() {
            elem = elem.set("stroke-dasharray", dasharray);
        }

        elem
    }};
}
