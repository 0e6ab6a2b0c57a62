//! Configuration types for Tracery.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from
//! external sources; every field has a default.
//!
//! - [`AppConfig`] - Configuration root.
//! - [`TextConfig`] - How text is measured. Text size feeds into geometry
//!   (lifeline widths, label bounds and the gap between activations), so this
//!   section changes layout results.
//! - [`StyleConfig`] - Presentation options that never affect geometry.
//!
//! # Example
//!
//! ```
//! # use tracery::config::{AppConfig, MeasureBackend};
//! let config = AppConfig::default();
//! assert_eq!(config.text().measure(), MeasureBackend::Font);
//! assert!(config.style().background_color().is_ok());
//! ```

use serde::Deserialize;

use tracery_core::{
    color::Color,
    draw::{FontMetrics, MonospaceMetrics, TextMeasure},
};

/// Configuration root.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    text: TextConfig,

    #[serde(default)]
    style: StyleConfig,
}

impl AppConfig {
    pub fn new(text: TextConfig, style: StyleConfig) -> Self {
        Self { text, style }
    }

    pub fn text(&self) -> &TextConfig {
        &self.text
    }

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }
}

/// Text measurement backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasureBackend {
    /// Shape text with the installed fonts.
    #[default]
    Font,
    /// Fixed glyph advance and line height, independent of installed fonts.
    Monospace,
}

/// Text measurement settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TextConfig {
    #[serde(default)]
    measure: MeasureBackend,

    #[serde(default = "default_font_family")]
    font_family: String,

    #[serde(default = "default_font_size")]
    font_size: u16,
}

fn default_font_family() -> String {
    "Arial".to_string()
}

fn default_font_size() -> u16 {
    12
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            measure: MeasureBackend::default(),
            font_family: default_font_family(),
            font_size: default_font_size(),
        }
    }
}

impl TextConfig {
    pub fn new(measure: MeasureBackend, font_family: &str, font_size: u16) -> Self {
        Self {
            measure,
            font_family: font_family.to_string(),
            font_size,
        }
    }

    /// Deterministic monospace measurement.
    pub fn monospace() -> Self {
        Self {
            measure: MeasureBackend::Monospace,
            ..Self::default()
        }
    }

    pub fn measure(&self) -> MeasureBackend {
        self.measure
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    pub fn font_size(&self) -> u16 {
        self.font_size
    }

    /// Creates the text measurement backend described by this configuration.
    pub fn metrics(&self) -> Box<dyn TextMeasure> {
        match self.measure {
            MeasureBackend::Font => Box::new(FontMetrics::new(&self.font_family, self.font_size)),
            MeasureBackend::Monospace => Box::new(MonospaceMetrics::default()),
        }
    }
}

/// Visual styling options.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StyleConfig {
    /// Background color of exported documents, as a color string.
    #[serde(default)]
    background_color: Option<String>,
}

impl StyleConfig {
    pub fn new(background_color: Option<&str>) -> Self {
        Self {
            background_color: background_color.map(str::to_string),
        }
    }

    /// Returns the parsed background [`Color`], or `None` if no color is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string is not a valid color.
    pub fn background_color(&self) -> Result<Option<Color>, String> {
        self.background_color
            .as_deref()
            .map(Color::new)
            .transpose()
            .map_err(|err| format!("Invalid background color in config: {err}"))
    }
}
