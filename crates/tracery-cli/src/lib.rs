//! CLI logic for the Tracery diagram tool.
//!
//! Loads a diagram file, runs a layout pass, writes the SVG and optionally
//! prints the bounds of every element.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{
    fs,
    io::{self, Write},
};

use log::{info, warn};

use tracery::{DiagramEngine, TraceryError, diagram::Diagram, render::Layout};

/// Run the Tracery CLI application
///
/// Reads the diagram file named by `args`, renders it and writes the SVG to
/// the output path. With `--dump-bounds`, the layout is also printed to
/// standard output.
///
/// # Errors
///
/// Returns `TraceryError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Diagram files that cannot be decoded
/// - Model precondition violations during layout or rendering
pub fn run(args: &Args) -> Result<(), TraceryError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing diagram"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let engine = DiagramEngine::new(app_config);
    let diagram = engine.load(&args.input)?;

    let layout = engine.layout(&diagram)?;
    for element in layout.skipped() {
        warn!(element:%; "Element skipped, its structure is inconsistent");
    }

    if args.dump_bounds {
        let stdout = io::stdout();
        dump_bounds(&diagram, &layout, &mut stdout.lock())?;
    }

    let svg = engine.render_layout_svg(&diagram, &layout)?;
    fs::write(&args.output, svg)?;

    info!(output_file = args.output; "SVG exported successfully");

    Ok(())
}

/// Writes one line per laid out element: id, type and bounds.
pub fn dump_bounds(
    diagram: &Diagram,
    layout: &Layout,
    out: &mut impl Write,
) -> Result<(), TraceryError> {
    for (id, bounds) in layout.nodes() {
        let kind = diagram.node(id)?.kind();
        writeln!(out, "{id}\t{kind}\t{bounds}")?;
    }
    for (id, bounds) in layout.edges() {
        let kind = diagram.edge(id)?.kind();
        writeln!(out, "{id}\t{kind}\t{bounds}")?;
    }
    writeln!(out, "diagram\t{}", layout.bounds())?;
    Ok(())
}
