//! Error adapter for converting TraceryError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI. Diagram files that
//! fail to decode keep their source text, and JSON syntax errors are labelled
//! at the offending line and column.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceSpan};

use tracery::{TraceryError, persistence::PersistenceError};

/// Adapter for a diagram file that could not be decoded.
pub struct PersistenceAdapter<'a> {
    err: &'a PersistenceError,
    /// Contents of the diagram file
    src: &'a str,
}

impl<'a> PersistenceAdapter<'a> {
    pub fn new(err: &'a PersistenceError, src: &'a str) -> Self {
        Self { err, src }
    }

    /// Span of the offending text, for syntax errors only.
    fn span(&self) -> Option<SourceSpan> {
        match self.err {
            PersistenceError::Syntax(json) if !self.src.is_empty() => {
                let offset = byte_offset(self.src, json.line(), json.column());
                let len = usize::from(offset < self.src.len());
                Some(SourceSpan::new(offset.into(), len))
            }
            _ => None,
        }
    }
}

impl fmt::Debug for PersistenceAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistenceAdapter")
            .field("err", &self.err)
            .finish()
    }
}

impl fmt::Display for PersistenceAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.err, f)
    }
}

impl std::error::Error for PersistenceAdapter<'_> {}

impl MietteDiagnostic for PersistenceAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("tracery::persistence"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match self.err {
            PersistenceError::Syntax(_) => "diagram files are JSON documents",
            PersistenceError::DiagramType(_) => {
                "set the `diagram` field to \"SequenceDiagram\""
            }
            PersistenceError::UnknownNodeType(_) => {
                "node types are ImplicitParameterNode, CallNode, NoteNode and PointNode"
            }
            PersistenceError::UnknownEdgeType(_) => {
                "edge types are CallEdge, ConstructorEdge, ReturnEdge and NoteEdge"
            }
            PersistenceError::DuplicateId(_)
            | PersistenceError::DanglingId(_)
            | PersistenceError::MultipleParents(_)
            | PersistenceError::ContainmentCycle(_) => {
                "every node needs a unique id and at most one parent"
            }
            PersistenceError::Model(_) => return None,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.span().map(|_| &self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.span()?;
        Some(Box::new(std::iter::once(
            LabeledSpan::new_primary_with_span(Some("here".to_string()), span),
        )))
    }
}

/// Adapter for [`TraceryError`] variants without source information.
pub struct ErrorAdapter<'a>(pub &'a TraceryError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            TraceryError::Io(_) => "tracery::io",
            TraceryError::Model(_) => "tracery::model",
            TraceryError::Persistence { .. } => "tracery::persistence",
            TraceryError::Config(_) => "tracery::config",
        };
        Some(Box::new(code))
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A diagram file error, with the file contents.
    Persistence(PersistenceAdapter<'a>),
    /// Any other error.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Persistence(p) => fmt::Display::fmt(p, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Persistence(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Persistence(p) => p.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Persistence(p) => p.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Persistence(p) => p.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Persistence(p) => p.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Byte offset of a 1-based line and column, clamped to the source length.
fn byte_offset(src: &str, line: usize, column: usize) -> usize {
    let line_start: usize = src
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(src.len())
}

/// Convert a [`TraceryError`] into a list of reportable errors.
pub fn to_reportables(err: &TraceryError) -> Vec<Reportable<'_>> {
    match err {
        TraceryError::Persistence { err, src } => {
            vec![Reportable::Persistence(PersistenceAdapter::new(err, src))]
        }
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}

#[cfg(test)]
mod tests {
    use tracery::persistence;

    use super::*;

    fn decode_error(src: &str) -> TraceryError {
        let err = persistence::decode(src).unwrap_err();
        TraceryError::new_persistence_error(err, src)
    }

    #[test]
    fn test_byte_offset() {
        let src = "ab\ncde\nf";
        assert_eq!(byte_offset(src, 1, 1), 0);
        assert_eq!(byte_offset(src, 2, 2), 4);
        assert_eq!(byte_offset(src, 3, 1), 7);
        assert_eq!(byte_offset(src, 9, 9), src.len());
    }

    #[test]
    fn test_syntax_error_is_labelled() {
        let err = decode_error("{\n  \"diagram\": }\n");
        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 1);

        let reportable = &reportables[0];
        assert!(matches!(reportable, Reportable::Persistence(_)));
        assert_eq!(
            reportable.code().unwrap().to_string(),
            "tracery::persistence"
        );
        assert!(reportable.source_code().is_some());
        let labels: Vec<_> = reportable.labels().unwrap().collect();
        assert_eq!(labels.len(), 1);
        // Second line starts at byte 2.
        assert!(labels[0].offset() >= 2);
    }

    #[test]
    fn test_semantic_error_has_help_but_no_label() {
        let err = decode_error(r#"{"diagram": "ClassDiagram", "nodes": [], "edges": []}"#);
        let reportables = to_reportables(&err);
        let reportable = &reportables[0];
        assert!(reportable.help().is_some());
        assert!(reportable.labels().is_none());
        assert!(reportable.to_string().contains("ClassDiagram"));
    }

    #[test]
    fn test_other_errors_map_to_codes() {
        let err = TraceryError::Config("bad".to_string());
        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 1);
        assert_eq!(reportables[0].code().unwrap().to_string(), "tracery::config");
        assert!(reportables[0].labels().is_none());
    }

    #[test]
    fn test_renders_with_graphical_handler() {
        let err = decode_error("{\n  \"diagram\": }\n");
        let handler = miette::GraphicalReportHandler::new();
        let mut out = String::new();
        handler
            .render_report(&mut out, &to_reportables(&err)[0])
            .unwrap();
        assert!(out.contains("tracery::persistence"));
    }
}
