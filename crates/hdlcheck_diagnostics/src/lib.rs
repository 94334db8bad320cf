//! Normalized diagnostics shared by the compiler adapters, the static
//! linter, and the transports.

pub mod diagnostic;
pub mod severity;
pub mod ui;

pub use diagnostic::{sort_diagnostics, Diagnostic};
pub use severity::Severity;
pub use ui::{UiLevel, UiMessage, UiQueue};

/// Checker tag for diagnostics produced by hdlcheck itself.
pub const CHECKER_NAME: &str = "HDL Code Checker";

/// Checker tag for diagnostics produced by the static style linter.
pub const STATIC_CHECKER_NAME: &str = "HDL Code Checker/static";
