//! The normalized diagnostic record returned to editors.

use crate::severity::Severity;
use crate::CHECKER_NAME;
use hdlcheck_common::path::same_file;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A single diagnostic message from a compiler, the static linter, or
/// hdlcheck itself.
///
/// Equality ignores the `checker` tag and compares `path` by file identity,
/// so a compiler diagnostic and its cached copy compare equal even when the
/// paths are spelled differently.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Name of the tool that produced this diagnostic.
    pub checker: String,
    /// File the diagnostic refers to, when known.
    pub path: Option<PathBuf>,
    /// 1-based line number, when known.
    pub line: Option<u32>,
    /// 1-based column number, when known.
    pub column: Option<u32>,
    /// Tool-specific error code (e.g. `vcom-1576`).
    pub code: Option<String>,
    /// Message severity.
    pub severity: Severity,
    /// Message text.
    pub text: String,
}

impl Diagnostic {
    /// Creates a diagnostic with the default checker tag.
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            checker: CHECKER_NAME.to_string(),
            path: None,
            line: None,
            column: None,
            code: None,
            severity,
            text: text.into(),
        }
    }

    /// Creates an error diagnostic.
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Severity::Error, text)
    }

    /// Creates a warning diagnostic.
    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(Severity::Warning, text)
    }

    /// Sets the checker tag.
    pub fn with_checker(mut self, checker: impl Into<String>) -> Self {
        self.checker = checker.into();
        self
    }

    /// Sets the file path.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the 1-based line number.
    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    /// Sets the 1-based column number.
    pub fn with_column(mut self, column: u32) -> Self {
        self.column = Some(column);
        self
    }

    /// Sets the tool-specific error code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl PartialEq for Diagnostic {
    fn eq(&self, other: &Self) -> bool {
        let paths_match = match (&self.path, &other.path) {
            (Some(a), Some(b)) => same_file(a, b),
            (None, None) => true,
            _ => false,
        };
        paths_match
            && self.line == other.line
            && self.column == other.column
            && self.code == other.code
            && self.severity == other.severity
            && self.text == other.text
    }
}

impl Eq for Diagnostic {}

/// Sorts diagnostics for display: errors first, then by line number, then
/// by error code.
pub fn sort_diagnostics(diags: &mut [Diagnostic]) {
    diags.sort_by(|a, b| {
        (a.severity.rank(), a.line, a.code.as_deref())
            .cmp(&(b.severity.rank(), b.line, b.code.as_deref()))
    });
}
