//! GHDL adapter.

use crate::core::{BuildCore, BuildRequest};
use crate::error::SanityCheckError;
use crate::process::run_command;
use crate::{Builder, RebuildHint};
use hdlcheck_common::{FileType, Identifier};
use hdlcheck_diagnostics::{Diagnostic, Severity};
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static DIAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<path>[^:]+):(?P<line>\d+):(?P<column>\d+):(?P<warning>warning:)?\s*(?P<text>.*)$")
        .unwrap()
});
static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"GHDL\s+([\w.-]+)").unwrap());

/// Adapter for the GHDL compiler.
///
/// Each build is two-phase: `ghdl -i` imports the source into the work
/// library, then `ghdl -s` (syntax) and `ghdl -a` (analyze) produce the
/// diagnostics. GHDL reports no rebuild hints.
pub struct Ghdl {
    core: BuildCore,
}

impl Ghdl {
    /// Creates the adapter rooted at the given work directory.
    pub fn new(work_dir: &Path) -> Self {
        Self {
            core: BuildCore::new(work_dir),
        }
    }

    fn common_args(&self, request: &BuildRequest<'_>) -> Vec<String> {
        vec![
            format!("-P{}", self.core.work_dir().display()),
            format!("--work={}", request.library),
            format!("--workdir={}", self.core.work_dir().display()),
        ]
    }
}

impl Builder for Ghdl {
    fn name(&self) -> &'static str {
        "ghdl"
    }

    fn core(&self) -> &BuildCore {
        &self.core
    }

    fn check_environment(&self) -> Result<String, SanityCheckError> {
        which::which("ghdl")
            .map_err(|err| SanityCheckError::new("ghdl", format!("ghdl not found: {err}")))?;
        let lines = run_command("ghdl", &["--version".to_string()], None)
            .map_err(|err| SanityCheckError::new("ghdl", err.to_string()))?;
        let first = lines.first().map(String::as_str).unwrap_or_default();
        VERSION_RE
            .captures(first)
            .map(|cap| cap[1].to_string())
            .ok_or_else(|| {
                SanityCheckError::new("ghdl", format!("unexpected version output: '{first}'"))
            })
    }

    fn builtin_libraries(&self) -> Vec<Identifier> {
        vec![Identifier::vhdl("ieee"), Identifier::vhdl("std")]
    }

    fn file_types(&self) -> Vec<FileType> {
        vec![FileType::Vhdl]
    }

    fn create_library(&self, _library: &Identifier) -> io::Result<()> {
        // Libraries materialize in the workdir on import; nothing to
        // pre-create beyond the directory itself.
        std::fs::create_dir_all(self.core.work_dir())
    }

    fn compile(&self, request: &BuildRequest<'_>) -> io::Result<Vec<String>> {
        let file = request.path.as_path().to_string_lossy().into_owned();

        let mut import = vec!["-i".to_string()];
        import.extend(self.common_args(request));
        import.push(file.clone());
        let mut lines = run_command("ghdl", &import, None)?;

        for phase in ["-s", "-a"] {
            let mut args = vec![phase.to_string()];
            args.extend(self.common_args(request));
            args.extend(request.effective_flags());
            args.push(file.clone());
            lines.extend(run_command("ghdl", &args, None)?);
        }
        Ok(lines)
    }

    fn ignore_line(&self, line: &str) -> bool {
        line.trim().is_empty() || line.starts_with("ghdl: compilation error")
    }

    fn parse_diagnostic_line(&self, line: &str) -> Vec<Diagnostic> {
        let caps = match DIAG_RE.captures(line) {
            Some(caps) => caps,
            None => return Vec::new(),
        };
        let severity = if caps.name("warning").is_some() {
            Severity::Warning
        } else {
            Severity::Error
        };
        let mut diag = Diagnostic::new(severity, caps["text"].trim())
            .with_checker(self.name())
            .with_path(PathBuf::from(&caps["path"]));
        diag.line = caps["line"].parse().ok();
        diag.column = caps["column"].parse().ok();
        vec![diag]
    }

    fn parse_rebuild_hint_line(&self, _line: &str) -> Vec<RebuildHint> {
        Vec::new()
    }
}
