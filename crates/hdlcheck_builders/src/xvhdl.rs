//! Xilinx Vivado (`xvhdl`) adapter.

use crate::core::{BuildCore, BuildRequest};
use crate::error::SanityCheckError;
use crate::process::run_command;
use crate::{Builder, RebuildHint};
use hdlcheck_common::{FileType, Identifier};
use hdlcheck_diagnostics::{Diagnostic, Severity};
use log::info;
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex};

static DIAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<severity>ERROR|WARNING):\s*\[(?P<code>[^\]]+)\]\s*(?P<text>.*?)\s*(?:\[(?P<path>[^:\]]+):(?P<line>\d+)\])?\s*$",
    )
    .unwrap()
});
static REBUILD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:(?P<rebuild_path>\S+\.vhdp?)\s+|(?P<library>\w+)/(?P<unit>\w+)\.vdb\s+)needs")
        .unwrap()
});
static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Vivado Simulator\s+([\d.]+)").unwrap());

/// Adapter for the Vivado `xvhdl` compiler.
///
/// Libraries are registered by rewriting a small init file of `lib=path`
/// lines that `xvhdl --initfile` consumes.
pub struct Xvhdl {
    core: BuildCore,
    init_file: PathBuf,
    built_libraries: Mutex<Vec<String>>,
}

impl Xvhdl {
    /// Creates the adapter rooted at the given work directory.
    pub fn new(work_dir: &Path) -> Self {
        Self {
            core: BuildCore::new(work_dir),
            init_file: work_dir.join(".xvhdl.init"),
            built_libraries: Mutex::new(Vec::new()),
        }
    }
}

impl Builder for Xvhdl {
    fn name(&self) -> &'static str {
        "xvhdl"
    }

    fn core(&self) -> &BuildCore {
        &self.core
    }

    fn check_environment(&self) -> Result<String, SanityCheckError> {
        which::which("xvhdl")
            .map_err(|err| SanityCheckError::new("xvhdl", format!("xvhdl not found: {err}")))?;
        let lines = run_command(
            "xvhdl",
            &["--nolog".to_string(), "--version".to_string()],
            None,
        )
        .map_err(|err| SanityCheckError::new("xvhdl", err.to_string()))?;
        let first = lines.first().map(String::as_str).unwrap_or_default();
        VERSION_RE
            .captures(first)
            .map(|cap| cap[1].to_string())
            .ok_or_else(|| {
                SanityCheckError::new("xvhdl", format!("unexpected version output: '{first}'"))
            })
    }

    fn builtin_libraries(&self) -> Vec<Identifier> {
        [
            "ieee",
            "std",
            "unisim",
            "xilinxcorelib",
            "synplify",
            "synopsis",
            "maxii",
            "family_support",
        ]
        .into_iter()
        .map(Identifier::vhdl)
        .collect()
    }

    fn file_types(&self) -> Vec<FileType> {
        vec![FileType::Vhdl]
    }

    fn create_library(&self, library: &Identifier) -> io::Result<()> {
        let mut built = self.built_libraries.lock().unwrap();
        let name = library.name().to_string();
        if built.contains(&name) {
            return Ok(());
        }
        info!("registering library '{library}'");
        built.push(name);

        let contents: String = built
            .iter()
            .map(|lib| {
                format!(
                    "{lib}={}\n",
                    self.core.work_dir().join(lib).display()
                )
            })
            .collect();
        std::fs::write(&self.init_file, contents)
    }

    fn compile(&self, request: &BuildRequest<'_>) -> io::Result<Vec<String>> {
        let mut args = vec![
            "--nolog".to_string(),
            "--verbose".to_string(),
            "0".to_string(),
            "--initfile".to_string(),
            self.init_file.to_string_lossy().into_owned(),
            "--work".to_string(),
            request.library.name().to_string(),
        ];
        args.extend(request.effective_flags());
        args.push(request.path.as_path().to_string_lossy().into_owned());
        run_command("xvhdl", &args, None)
    }

    fn ignore_line(&self, line: &str) -> bool {
        if line.trim().is_empty() {
            return true;
        }
        !(line.starts_with("ERROR") || line.starts_with("WARNING"))
    }

    fn parse_diagnostic_line(&self, line: &str) -> Vec<Diagnostic> {
        let caps = match DIAG_RE.captures(line) {
            Some(caps) => caps,
            None => return Vec::new(),
        };
        let severity = match &caps["severity"] {
            "ERROR" => Severity::Error,
            _ => Severity::Warning,
        };
        let mut diag = Diagnostic::new(severity, caps["text"].trim())
            .with_checker(self.name())
            .with_code(&caps["code"]);
        if let Some(path) = caps.name("path") {
            diag.path = Some(PathBuf::from(path.as_str()));
        }
        if let Some(line_no) = caps.name("line") {
            diag.line = line_no.as_str().parse().ok();
        }
        vec![diag]
    }

    fn parse_rebuild_hint_line(&self, line: &str) -> Vec<RebuildHint> {
        if !line.starts_with("ERROR") {
            return Vec::new();
        }
        REBUILD_RE
            .captures_iter(line)
            .map(|caps| {
                // The compiler either names the stale file directly or the
                // design unit whose .vdb is out of date; a missing path
                // group means the latter.
                match caps.name("rebuild_path") {
                    Some(path) => RebuildHint::Path {
                        path: PathBuf::from(path.as_str()),
                    },
                    None => RebuildHint::Unit {
                        library: Identifier::vhdl("work"),
                        unit: Identifier::vhdl(&caps["unit"]),
                    },
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xvhdl() -> (tempfile::TempDir, Xvhdl) {
        let dir = tempfile::tempdir().unwrap();
        let builder = Xvhdl::new(dir.path());
        (dir, builder)
    }

    #[test]
    fn parses_error_with_code_and_position() {
        let (_dir, builder) = xvhdl();
        let diags = builder.parse_diagnostic_line(
            "ERROR: [VRFC 10-1412] syntax error near ) [/work/source_with_error.vhd:12]",
        );
        assert_eq!(diags.len(), 1);
        let diag = &diags[0];
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.code.as_deref(), Some("VRFC 10-1412"));
        assert_eq!(diag.text, "syntax error near )");
        assert_eq!(
            diag.path.as_deref(),
            Some(Path::new("/work/source_with_error.vhd"))
        );
        assert_eq!(diag.line, Some(12));
    }

    #[test]
    fn parses_warning_without_position() {
        let (_dir, builder) = xvhdl();
        let diags =
            builder.parse_diagnostic_line("WARNING: [VRFC 10-0001] something advisory");
        assert_eq!(diags[0].severity, Severity::Warning);
        assert!(diags[0].path.is_none());
        assert_eq!(diags[0].text, "something advisory");
    }

    #[test]
    fn ignores_chatter() {
        let (_dir, builder) = xvhdl();
        assert!(builder.ignore_line("INFO: [VRFC 10-0000] all fine"));
        assert!(builder.ignore_line(""));
        assert!(!builder.ignore_line("ERROR: [X 1-2] nope"));
    }

    #[test]
    fn unit_rebuild_hint_uses_work_placeholder() {
        let (_dir, builder) = xvhdl();
        let hints = builder.parse_rebuild_hint_line(
            "ERROR: [VRFC 10-99] design unit mylib/some_pkg.vdb needs to be re-saved",
        );
        assert_eq!(
            hints,
            [RebuildHint::Unit {
                library: Identifier::vhdl("work"),
                unit: Identifier::vhdl("some_pkg"),
            }]
        );
    }

    #[test]
    fn path_rebuild_hint_carries_the_path() {
        let (_dir, builder) = xvhdl();
        let hints = builder
            .parse_rebuild_hint_line("ERROR: [VRFC 10-99] /work/pkg.vhd needs recompilation");
        assert_eq!(
            hints,
            [RebuildHint::Path {
                path: PathBuf::from("/work/pkg.vhd"),
            }]
        );
    }

    #[test]
    fn create_library_rewrites_init_file() {
        let (dir, builder) = xvhdl();
        builder.create_library(&Identifier::vhdl("lib_a")).unwrap();
        builder.create_library(&Identifier::vhdl("lib_b")).unwrap();
        // Re-registering must not duplicate the line.
        builder.create_library(&Identifier::vhdl("lib_a")).unwrap();

        let contents = std::fs::read_to_string(dir.path().join(".xvhdl.init")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("lib_a="));
        assert!(lines[1].starts_with("lib_b="));
    }
}
