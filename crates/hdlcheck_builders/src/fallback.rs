//! No-op adapter used when no real compiler is available.

use crate::core::{BuildCore, BuildRequest};
use crate::error::SanityCheckError;
use crate::{Builder, RebuildHint};
use hdlcheck_common::{FileType, Identifier};
use hdlcheck_diagnostics::Diagnostic;
use std::io;
use std::path::Path;

/// The fallback adapter: every operation is a no-op that succeeds.
///
/// Selected when the project file names no builder or when the configured
/// compiler fails its environment check. Keeps the static-linter path
/// functional with zero external tooling.
pub struct Fallback {
    core: BuildCore,
}

impl Fallback {
    /// Creates the adapter rooted at the given work directory.
    pub fn new(work_dir: &Path) -> Self {
        Self {
            core: BuildCore::new(work_dir),
        }
    }
}

impl Builder for Fallback {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn core(&self) -> &BuildCore {
        &self.core
    }

    fn check_environment(&self) -> Result<String, SanityCheckError> {
        Ok("<undefined>".to_string())
    }

    fn builtin_libraries(&self) -> Vec<Identifier> {
        Vec::new()
    }

    fn file_types(&self) -> Vec<FileType> {
        vec![FileType::Vhdl, FileType::Verilog, FileType::SystemVerilog]
    }

    fn create_library(&self, _library: &Identifier) -> io::Result<()> {
        Ok(())
    }

    fn compile(&self, _request: &BuildRequest<'_>) -> io::Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn ignore_line(&self, _line: &str) -> bool {
        true
    }

    fn parse_diagnostic_line(&self, _line: &str) -> Vec<Diagnostic> {
        Vec::new()
    }

    fn parse_rebuild_hint_line(&self, _line: &str) -> Vec<RebuildHint> {
        Vec::new()
    }
}
