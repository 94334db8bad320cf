//! Diagnostic severity levels, including the style tiers emitted by the
//! static linter.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The severity of a diagnostic message.
///
/// Compiler adapters emit `Info`/`Warning`/`Error`; the static linter emits
/// the `Style*` tiers. `None` marks output lines whose severity could not
/// be classified and is treated as an error by the transports.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Severity {
    /// Informational compiler output.
    Info,
    /// A compiler warning.
    Warning,
    /// A compiler error.
    Error,
    /// Informational style note.
    StyleInfo,
    /// A style warning (e.g. an unused signal).
    StyleWarning,
    /// A style error.
    StyleError,
    /// Unclassified severity.
    None,
}

impl Severity {
    /// Whether this severity should fail a batch build.
    pub fn is_error(self) -> bool {
        matches!(self, Severity::Error)
    }

    /// Sort rank used when ordering diagnostics for display. Errors sort
    /// first, then warnings, matching the original checker's output order.
    pub fn rank(self) -> u8 {
        match self {
            Severity::Error => 0,
            Severity::None => 1,
            Severity::StyleError => 2,
            Severity::Warning => 3,
            Severity::StyleWarning => 4,
            Severity::Info => 5,
            Severity::StyleInfo => 6,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "Info"),
            Severity::Warning => write!(f, "Warning"),
            Severity::Error => write!(f, "Error"),
            Severity::StyleInfo => write!(f, "Info (style)"),
            Severity::StyleWarning => write!(f, "Warning (style)"),
            Severity::StyleError => write!(f, "Error (style)"),
            Severity::None => write!(f, "None"),
        }
    }
}
