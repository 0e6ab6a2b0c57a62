//! Text measurement and text elements.
//!
//! Layout only needs to know how much room a string takes. That question is
//! answered by a [`TextMeasure`] implementation:
//!
//! - [`FontMetrics`] shapes the text with `cosmic-text` against system fonts.
//! - [`MonospaceMetrics`] uses a fixed advance per glyph and a fixed line
//!   height. It does not depend on installed fonts, which makes it the right
//!   choice when bounds must be reproducible across machines.
//!
//! Measurements are integers, rounded up.
//!
//! # Example
//!
//! ```
//! # use tracery_core::draw::{Alignment, MonospaceMetrics, TextDecorations, TextMeasure};
//! # use tracery_core::geometry::Dimension;
//! let metrics = MonospaceMetrics::default();
//! let plain = metrics.measure("abc", Alignment::CenterCenter, TextDecorations::NONE);
//! let padded = metrics.measure("abc", Alignment::CenterCenter, TextDecorations::PADDED);
//! assert_eq!(padded, Dimension::new(plain.width() + 14, plain.height() + 12));
//! ```

use std::{
    fmt,
    ops::BitOr,
    sync::{Mutex, OnceLock, PoisonError},
};

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping};
use log::{debug, info};
use svg::node::{Text as SvgText, element as svg_element};

use crate::{
    color::Color,
    geometry::{Dimension, Point, Rectangle},
};

/// Horizontal padding added on each side by [`TextDecorations::PADDED`].
pub const HORIZONTAL_PADDING: i32 = 7;
/// Vertical padding added on each side by [`TextDecorations::PADDED`].
pub const VERTICAL_PADDING: i32 = 6;

/// Placement of text inside the rectangle it is drawn into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alignment {
    TopLeft,
    TopCenter,
    #[default]
    CenterCenter,
}

/// Set of decorations applied to a string.
///
/// Decorations combine with `|`:
///
/// ```
/// # use tracery_core::draw::TextDecorations;
/// let both = TextDecorations::PADDED | TextDecorations::UNDERLINED;
/// assert!(both.is_padded() && both.is_underlined());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextDecorations {
    padded: bool,
    underlined: bool,
}

impl TextDecorations {
    pub const NONE: Self = Self {
        padded: false,
        underlined: false,
    };
    /// Surrounds the text with [`HORIZONTAL_PADDING`] and [`VERTICAL_PADDING`].
    pub const PADDED: Self = Self {
        padded: true,
        underlined: false,
    };
    /// Underlines the text. Does not change its size.
    pub const UNDERLINED: Self = Self {
        padded: false,
        underlined: true,
    };

    pub fn is_padded(self) -> bool {
        self.padded
    }

    pub fn is_underlined(self) -> bool {
        self.underlined
    }
}

impl BitOr for TextDecorations {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            padded: self.padded || rhs.padded,
            underlined: self.underlined || rhs.underlined,
        }
    }
}

/// Capability to measure a string.
///
/// Implementations must be deterministic: the same string measured twice with
/// the same decorations yields the same dimension.
pub trait TextMeasure: fmt::Debug {
    /// Size of the unpadded text. Empty text has a zero size.
    fn measure_raw(&self, text: &str) -> Dimension;

    /// Font family written into SVG text elements.
    fn font_family(&self) -> &str;

    /// Font size written into SVG text elements.
    fn font_size(&self) -> u16;

    /// Size of `text` drawn with `decorations`.
    ///
    /// `alignment` does not influence the size; it is part of the signature so
    /// that measuring and drawing use the same arguments.
    fn measure(&self, text: &str, _alignment: Alignment, decorations: TextDecorations) -> Dimension {
        let raw = self.measure_raw(text);
        if decorations.is_padded() {
            Dimension::new(
                raw.width() + 2 * HORIZONTAL_PADDING,
                raw.height() + 2 * VERTICAL_PADDING,
            )
        } else {
            raw
        }
    }
}

/// Deterministic metrics with a fixed glyph advance and line height.
#[derive(Debug, Clone)]
pub struct MonospaceMetrics {
    advance: i32,
    line_height: i32,
    font_size: u16,
}

impl MonospaceMetrics {
    pub fn new(advance: i32, line_height: i32) -> Self {
        Self {
            advance,
            line_height,
            font_size: 12,
        }
    }
}

impl Default for MonospaceMetrics {
    /// 7 units per glyph and 16 units per line.
    fn default() -> Self {
        Self::new(7, 16)
    }
}

impl TextMeasure for MonospaceMetrics {
    fn measure_raw(&self, text: &str) -> Dimension {
        if text.is_empty() {
            return Dimension::default();
        }
        let longest = text
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or_default() as i32;
        let lines = text.lines().count().max(1) as i32;
        Dimension::new(longest * self.advance, lines * self.line_height)
    }

    fn font_family(&self) -> &str {
        "monospace"
    }

    fn font_size(&self) -> u16 {
        self.font_size
    }
}

/// Metrics computed by shaping text with real fonts.
#[derive(Debug, Clone)]
pub struct FontMetrics {
    font_family: String,
    font_size: u16,
}

impl FontMetrics {
    pub fn new(font_family: &str, font_size: u16) -> Self {
        Self {
            font_family: font_family.to_string(),
            font_size,
        }
    }
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self::new("Arial", 12)
    }
}

impl TextMeasure for FontMetrics {
    fn measure_raw(&self, text: &str) -> Dimension {
        TEXT_MANAGER
            .get_or_init(TextManager::new)
            .calculate_text_size(text, &self.font_family, self.font_size)
    }

    fn font_family(&self) -> &str {
        &self.font_family
    }

    fn font_size(&self) -> u16 {
        self.font_size
    }
}

/// Owns the shared `FontSystem`, which is expensive to create.
struct TextManager {
    font_system: Mutex<FontSystem>,
}

impl TextManager {
    fn new() -> Self {
        info!("Initializing FontSystem");
        Self {
            font_system: Mutex::new(FontSystem::new()),
        }
    }

    fn calculate_text_size(&self, text: &str, font_family: &str, font_size: u16) -> Dimension {
        if text.is_empty() {
            return Dimension::default();
        }

        // A poisoned lock only means another measurement panicked; the font
        // database itself is still usable.
        let mut font_system = self
            .font_system
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        // Points to pixels at standard DPI.
        let font_size_px = f32::from(font_size) * 1.33;
        let metrics = Metrics::new(font_size_px, font_size_px * 1.15);

        let mut buffer = Buffer::new(&mut font_system, metrics);
        let mut buffer = buffer.borrow_with(&mut font_system);
        let attrs = Attrs::new().family(Family::Name(font_family));

        buffer.set_size(None, None);
        buffer.set_text(text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(true);

        let mut max_width: f32 = 0.0;
        let mut total_height: f32 = 0.0;
        let mut runs = 0;
        for run in buffer.layout_runs() {
            if let Some(last) = run.glyphs.last() {
                max_width = max_width.max(last.x + last.w);
            }
            total_height += metrics.line_height;
            runs += 1;
        }

        if runs == 0 {
            debug!(text = text; "No layout runs, estimating text size");
            max_width = text.chars().count() as f32 * (font_size_px * 0.55);
            total_height = metrics.line_height;
        }

        Dimension::new(max_width.ceil() as i32, total_height.ceil() as i32)
    }
}

static TEXT_MANAGER: OnceLock<TextManager> = OnceLock::new();

/// Builds an SVG text element for `content`, placed inside `area` according
/// to `alignment`.
///
/// Multi-line content becomes one `<tspan>` per line.
pub fn text_element(
    metrics: &dyn TextMeasure,
    content: &str,
    area: Rectangle,
    alignment: Alignment,
    decorations: TextDecorations,
    color: Option<Color>,
) -> svg_element::Text {
    let lines: Vec<&str> = content.lines().collect();
    let line_height = if lines.is_empty() {
        0
    } else {
        metrics.measure_raw(content).height() / lines.len() as i32
    };
    let padding = if decorations.is_padded() {
        Point::new(HORIZONTAL_PADDING, VERTICAL_PADDING)
    } else {
        Point::default()
    };

    let (anchor, x) = match alignment {
        Alignment::TopLeft => ("start", area.x() + padding.x()),
        Alignment::TopCenter | Alignment::CenterCenter => ("middle", area.center().x()),
    };
    let top = match alignment {
        Alignment::TopLeft | Alignment::TopCenter => area.y() + padding.y(),
        Alignment::CenterCenter => area.center().y() - line_height * lines.len() as i32 / 2,
    };

    let mut element = svg_element::Text::new("")
        .set("x", x)
        .set("y", top)
        .set("text-anchor", anchor)
        .set("dominant-baseline", "hanging")
        .set("font-family", metrics.font_family())
        .set("font-size", metrics.font_size());

    if decorations.is_underlined() {
        element = element.set("text-decoration", "underline");
    }
    if let Some(color) = color {
        element = element
            .set("fill", color.to_string())
            .set("fill-opacity", color.alpha());
    }

    for (index, line) in lines.into_iter().enumerate() {
        let dy = if index == 0 { 0 } else { line_height };
        let tspan = svg_element::TSpan::new("")
            .set("x", x)
            .set("dy", dy)
            .add(SvgText::new(line));
        element = element.add(tspan);
    }
    element
}
