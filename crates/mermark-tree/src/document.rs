//! Per-document context and diagnostics.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::node::Position;

/// How rendered diagrams are delivered into the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OutputMode {
    /// Write image files and reference them by relative path.
    #[default]
    File,
    /// Embed the rendered markup directly in the document.
    Inline,
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Severity {
    Info,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => f.write_str("info"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// A message recorded against a document.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Source position of the node the message is about.
    pub position: Option<Position>,
    /// Tag of the component that emitted the message.
    pub origin: &'static str,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(position) = &self.position {
            write!(f, "{position}: ")?;
        }
        write!(f, "{}: {} [{}]", self.severity, self.message, self.origin)
    }
}

/// State accompanying one document through a transformation.
///
/// Created once per transformation call. Diagnostics are appended in the
/// order they are recorded.
#[derive(Debug, Clone, Default)]
pub struct DocumentContext {
    /// Path of the source document (if known).
    pub source_path: Option<PathBuf>,
    /// Directory of the source document; relative references resolve against it.
    pub source_dir: PathBuf,
    /// Explicit directory for generated files.
    pub output_dir: Option<PathBuf>,
    /// Delivery mode for rendered diagrams.
    pub output_mode: OutputMode,
    diagnostics: Vec<Diagnostic>,
}

impl DocumentContext {
    /// Create a context for a document located in `source_dir`.
    #[must_use]
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            ..Self::default()
        }
    }

    /// Create a context for the document at `path`.
    ///
    /// The source directory is the path's parent (or `.` for bare file names).
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let source_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self {
            source_path: Some(path),
            source_dir,
            ..Self::default()
        }
    }

    /// Set an explicit output directory.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Set the output mode.
    #[must_use]
    pub fn with_output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    /// Directory of the source document.
    #[must_use]
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Append a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Record an informational message.
    pub fn info(
        &mut self,
        message: impl Into<String>,
        position: Option<Position>,
        origin: &'static str,
    ) {
        self.push(Diagnostic {
            severity: Severity::Info,
            message: message.into(),
            position,
            origin,
        });
    }

    /// Record an error message.
    pub fn error(
        &mut self,
        message: impl Into<String>,
        position: Option<Position>,
        origin: &'static str,
    ) {
        self.push(Diagnostic {
            severity: Severity::Error,
            message: message.into(),
            position,
            origin,
        });
    }

    /// Recorded diagnostics, in recording order.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Take ownership of the recorded diagnostics.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// True if any error diagnostic was recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}
