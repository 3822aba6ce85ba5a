//! Stderr reporting for `mermark render`.
//!
//! HTML may be written to stdout, so status lines and diagnostics always go
//! to stderr.

use std::fmt::Display;
use std::path::Path;

use console::{Style, Term};
use mermark_tree::Severity;

/// Colored stderr reporter.
pub(crate) struct Output {
    term: Term,
    success: Style,
    failure: Style,
    detail: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            success: Style::new().green(),
            failure: Style::new().red(),
            detail: Style::new().dim(),
        }
    }

    /// Print preformatted text as-is (JSON diagnostics).
    pub(crate) fn raw(&self, text: &str) {
        let _ = self.term.write_line(text);
    }

    /// Print one diagnostic line: errors in red, info dimmed.
    pub(crate) fn diagnostic(&self, severity: Severity, line: &str) {
        let style = match severity {
            Severity::Error => &self.failure,
            Severity::Info => &self.detail,
        };
        let _ = self.term.write_line(&style.apply_to(line).to_string());
    }

    /// Report the written HTML file.
    pub(crate) fn wrote(&self, path: &Path) {
        let line = format!("Wrote {}", path.display());
        let _ = self.term.write_line(&self.success.apply_to(line).to_string());
    }

    /// Report an error that ends the command.
    pub(crate) fn fatal(&self, err: &impl Display) {
        let line = format!("Error: {err}");
        let _ = self.term.write_line(&self.failure.apply_to(line).to_string());
    }
}
