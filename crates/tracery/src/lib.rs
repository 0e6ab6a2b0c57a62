//! Tracery - a layout engine for interaction (sequence) diagrams.
//!
//! Tracery computes the geometry of lifelines, activations, notes and the
//! edges between them. Positions derive from the diagram structure alone, so
//! a diagram saved and loaded again lays out exactly as before.
//!
//! The element model, geometry primitives and drawing surface live in
//! `tracery-core` and are re-exported here.

pub mod config;
pub mod control_flow;
pub mod persistence;
pub mod render;
pub mod storage;

mod error;

pub use tracery_core::{color, diagram, draw, geometry};

pub use error::TraceryError;

use std::path::Path;

use log::{debug, info};

use color::Color;
use config::AppConfig;
use diagram::Diagram;
use draw::TextMeasure;
use render::{DiagramRenderer, Layout};

/// Entry point for loading, laying out and rendering diagrams.
///
/// The engine owns the configuration and the text measurement backend it
/// selects. It holds no diagram state: every call works on the diagram it is
/// given.
///
/// # Examples
///
/// ```rust
/// use tracery::{
///     DiagramEngine,
///     config::{AppConfig, StyleConfig, TextConfig},
///     diagram::{Diagram, EdgeKind, NodeKind, keys},
///     geometry::Point,
/// };
///
/// let mut diagram = Diagram::new();
/// let client = diagram.add_root_node(NodeKind::ImplicitParameter, Point::new(0, 0));
/// let server = diagram.add_root_node(NodeKind::ImplicitParameter, Point::new(200, 0));
/// diagram.node_properties_mut(client)?.set(keys::NAME, "client");
/// let caller = diagram.add_child(client, NodeKind::Call)?;
/// let callee = diagram.add_child(server, NodeKind::Call)?;
/// diagram.connect(EdgeKind::Call, caller, callee)?;
///
/// let engine = DiagramEngine::new(AppConfig::new(TextConfig::monospace(), StyleConfig::default()));
/// let layout = engine.layout(&diagram)?;
/// assert!(layout.bounds().contains_rectangle(layout.node(callee).unwrap()));
///
/// let svg = engine.render_svg(&diagram)?;
/// assert!(svg.contains("<svg"));
/// # Ok::<(), tracery::TraceryError>(())
/// ```
#[derive(Debug)]
pub struct DiagramEngine {
    config: AppConfig,
    metrics: Box<dyn TextMeasure>,
}

impl Default for DiagramEngine {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl DiagramEngine {
    /// Creates an engine measuring text as `config` describes.
    pub fn new(config: AppConfig) -> Self {
        let metrics = config.text().metrics();
        debug!(
            font_family = metrics.font_family(),
            font_size = metrics.font_size();
            "Text measurement ready"
        );
        Self { config, metrics }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn metrics(&self) -> &dyn TextMeasure {
        self.metrics.as_ref()
    }

    /// A renderer for `diagram` using this engine's text measurement.
    pub fn renderer<'a>(&'a self, diagram: &'a Diagram) -> DiagramRenderer<'a> {
        DiagramRenderer::new(diagram, self.metrics.as_ref())
    }

    /// Computes the bounds of every element of `diagram`.
    ///
    /// # Errors
    ///
    /// Returns [`TraceryError::Model`] if a precondition is violated.
    /// Elements with an inconsistent structure do not fail the pass; they are
    /// listed in [`Layout::skipped`].
    pub fn layout(&self, diagram: &Diagram) -> Result<Layout, TraceryError> {
        Ok(self.renderer(diagram).layout()?)
    }

    /// Renders `diagram` as an SVG document.
    ///
    /// # Errors
    ///
    /// Returns [`TraceryError::Config`] if the configured background color is
    /// invalid, and [`TraceryError::Model`] if a precondition is violated.
    pub fn render_svg(&self, diagram: &Diagram) -> Result<String, TraceryError> {
        let svg = self.renderer(diagram).render_svg(self.background()?)?;
        info!(bytes = svg.len(); "SVG rendered");
        Ok(svg)
    }

    /// Renders `diagram` as an SVG document using the bounds in `layout`,
    /// which must have been computed for `diagram` as it is now.
    ///
    /// # Errors
    ///
    /// Same as [`DiagramEngine::render_svg`]; a layout of another diagram is a
    /// [`TraceryError::Model`].
    pub fn render_layout_svg(
        &self,
        diagram: &Diagram,
        layout: &Layout,
    ) -> Result<String, TraceryError> {
        let svg = self
            .renderer(diagram)
            .render_layout_svg(layout, self.background()?)?;
        info!(bytes = svg.len(); "SVG rendered");
        Ok(svg)
    }

    fn background(&self) -> Result<Option<Color>, TraceryError> {
        self.config
            .style()
            .background_color()
            .map_err(TraceryError::Config)
    }

    /// Reads a diagram file.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Diagram, TraceryError> {
        persistence::read(path)
    }

    /// Writes a diagram file.
    pub fn save(&self, diagram: &Diagram, path: impl AsRef<Path>) -> Result<(), TraceryError> {
        persistence::save(diagram, path)
    }
}
