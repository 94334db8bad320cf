//! ModelSim (`vcom`) adapter.

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

static LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\*\s+(Error|Warning)(?:\s*\(suppressible\))?:\s*(.*)$").unwrap());
static FILE_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?\.(?:vhd|vhdl|v|sv|svh))\((\d+)\):\s*(.*)$").unwrap());
static CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\((vcom-\d+)\)").unwrap());
static REBUILD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Recompile\s+(\S+)\s+because\s+\S+\s+has changed").unwrap());
static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"vcom\s+([\w.]+)\s+Compiler").unwrap());

/// Adapter for the ModelSim `vcom` compiler.
pub struct MSim {
    core: BuildCore,
    modelsim_ini: PathBuf,
    version: Mutex<Option<String>>,
}

impl MSim {
    /// Creates the adapter rooted at the given work directory.
    pub fn new(work_dir: &Path) -> Self {
        Self {
            core: BuildCore::new(work_dir),
            modelsim_ini: work_dir.join("modelsim.ini"),
            version: Mutex::new(None),
        }
    }

    /// `vlib` grew a `-type directory` switch in 10.2 whose default changed
    /// over releases; pass it explicitly on new enough versions.
    fn vlib_args(&self) -> Vec<String> {
        let version = self.version.lock().unwrap();
        match version.as_deref() {
            Some(v) if version_at_least(v, (10, 2)) => {
                vec!["-type".to_string(), "directory".to_string()]
            }
            _ => Vec::new(),
        }
    }
}

impl Builder for MSim {
    fn name(&self) -> &'static str {
        "msim"
    }

    fn core(&self) -> &BuildCore {
        &self.core
    }

    fn check_environment(&self) -> Result<String, SanityCheckError> {
        which::which("vcom")
            .map_err(|err| SanityCheckError::new("msim", format!("vcom not found: {err}")))?;
        let lines = run_command("vcom", &["-version".to_string()], None)
            .map_err(|err| SanityCheckError::new("msim", err.to_string()))?;
        let first = lines.first().map(String::as_str).unwrap_or_default();
        let version = VERSION_RE
            .captures(first)
            .map(|cap| cap[1].to_string())
            .ok_or_else(|| {
                SanityCheckError::new("msim", format!("unexpected version output: '{first}'"))
            })?;
        info!("vcom version '{version}'");
        *self.version.lock().unwrap() = Some(version.clone());
        Ok(version)
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
        vec![FileType::Vhdl, FileType::Verilog, FileType::SystemVerilog]
    }

    fn create_library(&self, library: &Identifier) -> io::Result<()> {
        let library_path = self.core.work_dir().join(library.name());
        if library_path.exists() {
            return Ok(());
        }
        info!("creating library '{library}'");

        let mut vlib = self.vlib_args();
        vlib.push(library_path.to_string_lossy().into_owned());
        run_command("vlib", &vlib, Some(self.core.work_dir()))?;

        let vmap = vec![
            "-modelsimini".to_string(),
            self.modelsim_ini.to_string_lossy().into_owned(),
            library.name().to_string(),
            library_path.to_string_lossy().into_owned(),
        ];
        run_command("vmap", &vmap, Some(self.core.work_dir()))?;
        Ok(())
    }

    fn compile(&self, request: &BuildRequest<'_>) -> io::Result<Vec<String>> {
        let mut args = vec![
            "-modelsimini".to_string(),
            self.modelsim_ini.to_string_lossy().into_owned(),
            "-work".to_string(),
            self.core
                .work_dir()
                .join(request.library.name())
                .to_string_lossy()
                .into_owned(),
        ];
        args.extend(request.effective_flags());
        args.push(request.path.as_path().to_string_lossy().into_owned());
        run_command("vcom", &args, None)
    }

    fn ignore_line(&self, line: &str) -> bool {
        if line.trim().is_empty() || line.trim_end().ends_with("VHDL Compiler exiting") {
            return true;
        }
        !(line.starts_with("** Error") || line.starts_with("** Warning"))
    }

    fn parse_diagnostic_line(&self, line: &str) -> Vec<Diagnostic> {
        let caps = match LINE_RE.captures(line) {
            Some(caps) => caps,
            None => return Vec::new(),
        };
        let severity = match &caps[1] {
            "Error" => Severity::Error,
            _ => Severity::Warning,
        };
        let rest = caps[2].to_string();

        let mut diag = Diagnostic::new(severity, "").with_checker(self.name());
        let mut text = rest.as_str();
        if let Some(file_caps) = FILE_LINE_RE.captures(text) {
            diag.path = Some(PathBuf::from(&file_caps[1]));
            diag.line = file_caps[2].parse().ok();
            let tail_start = file_caps.get(3).unwrap().start();
            text = &rest[tail_start..];
        }
        if let Some(code_caps) = CODE_RE.captures(text) {
            diag.code = Some(code_caps[1].to_string());
            // Strip a leading "(vcom-NNNN) " so the text starts with the
            // actual message.
            let whole = code_caps.get(0).unwrap();
            if whole.start() == 0 {
                text = text[whole.end()..].trim_start();
            }
        }
        diag.text = text.trim().to_string();
        vec![diag]
    }

    fn parse_rebuild_hint_line(&self, line: &str) -> Vec<RebuildHint> {
        if !line.contains("(vcom-13)") {
            return Vec::new();
        }
        REBUILD_RE
            .captures_iter(line)
            .map(|cap| {
                let dotted = &cap[1];
                let (library, unit) = dotted.split_once('.').unwrap_or(("work", dotted));
                RebuildHint::Unit {
                    library: Identifier::vhdl(library),
                    unit: Identifier::vhdl(unit),
                }
            })
            .collect()
    }
}

fn version_at_least(version: &str, wanted: (u32, u32)) -> bool {
    let mut parts = version.split('.').filter_map(|p| {
        p.chars()
            .take_while(|c| c.is_ascii_digit())
            .collect::<String>()
            .parse::<u32>()
            .ok()
    });
    let major = parts.next().unwrap_or(0);
    let minor = parts.next().unwrap_or(0);
    (major, minor) >= wanted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msim() -> (tempfile::TempDir, MSim) {
        let dir = tempfile::tempdir().unwrap();
        let builder = MSim::new(dir.path());
        (dir, builder)
    }

    #[test]
    fn parses_error_with_file_line_and_code() {
        let (_dir, builder) = msim();
        let diags = builder.parse_diagnostic_line(
            "** Error: source_with_error.vhd(12): (vcom-1576) near \")\": expecting ';'.",
        );
        assert_eq!(diags.len(), 1);
        let diag = &diags[0];
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.path.as_deref(), Some(Path::new("source_with_error.vhd")));
        assert_eq!(diag.line, Some(12));
        assert_eq!(diag.code.as_deref(), Some("vcom-1576"));
        assert!(diag.text.contains("expecting ';'"));
    }

    #[test]
    fn parses_warning() {
        let (_dir, builder) = msim();
        let diags = builder
            .parse_diagnostic_line("** Warning: top.vhd(3): (vcom-1074) Non-locally static choice.");
        assert_eq!(diags[0].severity, Severity::Warning);
        assert_eq!(diags[0].line, Some(3));
        assert_eq!(diags[0].code.as_deref(), Some("vcom-1074"));
    }

    #[test]
    fn parses_fileless_error() {
        let (_dir, builder) = msim();
        let diags =
            builder.parse_diagnostic_line("** Error: (vcom-11) Could not find work.missing_pkg.");
        assert_eq!(diags[0].severity, Severity::Error);
        assert!(diags[0].path.is_none());
        assert_eq!(diags[0].code.as_deref(), Some("vcom-11"));
        assert!(diags[0].text.contains("Could not find"));
    }

    #[test]
    fn suppressible_errors_are_parsed() {
        let (_dir, builder) = msim();
        let diags = builder.parse_diagnostic_line(
            "** Error (suppressible): a.vhd(8): (vcom-1195) Cannot find expanded name.",
        );
        assert_eq!(diags[0].severity, Severity::Error);
        assert_eq!(diags[0].line, Some(8));
    }

    #[test]
    fn ignores_chatter() {
        let (_dir, builder) = msim();
        assert!(builder.ignore_line(""));
        assert!(builder.ignore_line("-- Loading package standard"));
        assert!(builder.ignore_line("Model Technology ModelSim vcom 10.7c VHDL Compiler exiting"));
        assert!(!builder.ignore_line("** Error: a.vhd(1): bad"));
        assert!(!builder.ignore_line("** Warning: a.vhd(1): meh"));
    }

    #[test]
    fn rebuild_hint_from_vcom_13() {
        let (_dir, builder) = msim();
        let hints = builder.parse_rebuild_hint_line(
            "** Error: (vcom-13) Recompile mylib.pkg because mylib.other has changed.",
        );
        assert_eq!(
            hints,
            [RebuildHint::Unit {
                library: Identifier::vhdl("mylib"),
                unit: Identifier::vhdl("pkg"),
            }]
        );
    }

    #[test]
    fn no_hint_without_vcom_13() {
        let (_dir, builder) = msim();
        assert!(builder
            .parse_rebuild_hint_line("Recompile a.b because c has changed")
            .is_empty());
    }

    #[test]
    fn builtin_libraries_include_vendor_extras() {
        let (_dir, builder) = msim();
        let builtins = builder.builtin_libraries();
        assert!(builtins.contains(&Identifier::vhdl("ieee")));
        assert!(builtins.contains(&Identifier::vhdl("unisim")));
    }

    #[test]
    fn version_comparison() {
        assert!(version_at_least("10.2", (10, 2)));
        assert!(version_at_least("10.7c", (10, 2)));
        assert!(version_at_least("2020.1", (10, 2)));
        assert!(!version_at_least("6.3", (10, 2)));
        assert!(!version_at_least("10.1", (10, 2)));
    }

    #[test]
    fn vlib_args_depend_on_version() {
        let (_dir, builder) = msim();
        assert!(builder.vlib_args().is_empty());
        *builder.version.lock().unwrap() = Some("10.7c".to_string());
        assert_eq!(builder.vlib_args(), ["-type", "directory"]);
        *builder.version.lock().unwrap() = Some("6.3".to_string());
        assert!(builder.vlib_args().is_empty());
    }
}
