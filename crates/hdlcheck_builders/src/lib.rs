//! External HDL compiler adapters.
//!
//! Each adapter wraps one external compiler behind the [`Builder`] trait:
//! command construction, diagnostic-line parsing, and rebuild-hint
//! extraction. The shared build flow (per-path caching, flag composition,
//! subprocess serialization) lives in [`core::BuildCore`] so the adapters
//! only describe what differs between tools.

mod core;
mod error;
mod fallback;
mod ghdl;
mod msim;
mod process;
mod xvhdl;

pub use crate::core::{BuildCache, BuildCacheEntry, BuildCore, BuildRequest, BuilderState};
pub use error::SanityCheckError;
pub use fallback::Fallback;
pub use ghdl::Ghdl;
pub use msim::MSim;
pub use xvhdl::Xvhdl;

use hdlcheck_common::{FileType, Identifier};
use hdlcheck_config::BuilderKind;
use hdlcheck_diagnostics::Diagnostic;
use log::warn;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

/// A structured "recompile something else first" message extracted from
/// compiler output.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RebuildHint {
    /// The compiler named the path that must be rebuilt.
    Path {
        /// Path to rebuild.
        path: PathBuf,
    },
    /// The compiler named a design unit that must be rebuilt. A library of
    /// `work` is rewritten to the triggering source's library before the
    /// hint leaves the adapter.
    Unit {
        /// Library of the out-of-date unit.
        library: Identifier,
        /// Name of the out-of-date unit.
        unit: Identifier,
    },
}

/// The contract every compiler adapter implements.
///
/// `build` is implemented once in terms of the per-adapter hooks; see
/// [`BuildCore::run_build`].
pub trait Builder: Send + Sync {
    /// Short adapter name, used as the diagnostic checker tag.
    fn name(&self) -> &'static str;

    /// The shared build state (cache, locks, work directory).
    fn core(&self) -> &BuildCore;

    /// Probes the compiler's environment, returning its version string.
    fn check_environment(&self) -> Result<String, SanityCheckError>;

    /// Libraries provided by the compiler itself; dependencies into them
    /// are never resolved to project sources.
    fn builtin_libraries(&self) -> Vec<Identifier>;

    /// File types this compiler can check.
    fn file_types(&self) -> Vec<FileType>;

    /// Ensures the target library exists before compiling into it.
    fn create_library(&self, library: &Identifier) -> io::Result<()>;

    /// Invokes the compile subprocess, returning combined stdout+stderr
    /// lines.
    fn compile(&self, request: &BuildRequest<'_>) -> io::Result<Vec<String>>;

    /// Whether an output line carries no information worth parsing.
    fn ignore_line(&self, line: &str) -> bool;

    /// Extracts zero or more diagnostics from one output line.
    fn parse_diagnostic_line(&self, line: &str) -> Vec<Diagnostic>;

    /// Extracts zero or more rebuild hints from one output line.
    fn parse_rebuild_hint_line(&self, line: &str) -> Vec<RebuildHint>;

    /// Builds one source, using the cached result when the file has not
    /// changed since the last compile.
    fn build(&self, request: &BuildRequest<'_>) -> (Vec<Diagnostic>, Vec<RebuildHint>) {
        self.core().run_build(self, request)
    }

    /// Snapshot of the per-path compile cache for persistence.
    fn state(&self) -> BuilderState {
        self.core().state()
    }

    /// Restores a previously persisted compile cache.
    fn restore_state(&self, state: BuilderState) {
        self.core().restore_state(state);
    }
}

/// Instantiates the adapter for a configured builder kind.
///
/// The work directory is created if missing. This does not run the
/// environment check; callers decide how to react to a failing probe.
pub fn create_builder(kind: BuilderKind, work_dir: &Path) -> io::Result<Box<dyn Builder>> {
    std::fs::create_dir_all(work_dir)?;
    Ok(match kind {
        BuilderKind::Msim => Box::new(MSim::new(work_dir)),
        BuilderKind::Ghdl => Box::new(Ghdl::new(work_dir)),
        BuilderKind::Xvhdl => Box::new(Xvhdl::new(work_dir)),
        BuilderKind::Fallback => Box::new(Fallback::new(work_dir)),
    })
}

/// Instantiates the configured adapter, demoting to [`Fallback`] when the
/// environment probe fails. The returned flag tells whether a demotion
/// happened so the caller can surface a UI error.
pub fn create_checked_builder(
    kind: BuilderKind,
    work_dir: &Path,
) -> io::Result<(Box<dyn Builder>, Option<SanityCheckError>)> {
    let builder = create_builder(kind, work_dir)?;
    match builder.check_environment() {
        Ok(version) => {
            log::info!("builder '{}' version '{}'", builder.name(), version);
            Ok((builder, None))
        }
        Err(err) => {
            warn!("environment check for '{}' failed: {}", kind, err);
            Ok((create_builder(BuilderKind::Fallback, work_dir)?, Some(err)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_creates_each_kind() {
        let dir = tempfile::tempdir().unwrap();
        for (kind, name) in [
            (BuilderKind::Msim, "msim"),
            (BuilderKind::Ghdl, "ghdl"),
            (BuilderKind::Xvhdl, "xvhdl"),
            (BuilderKind::Fallback, "fallback"),
        ] {
            let builder = create_builder(kind, dir.path()).unwrap();
            assert_eq!(builder.name(), name);
        }
    }

    #[test]
    fn factory_creates_work_dir() {
        let dir = tempfile::tempdir().unwrap();
        let work_dir = dir.path().join("nested").join("work");
        create_builder(BuilderKind::Fallback, &work_dir).unwrap();
        assert!(work_dir.is_dir());
    }

    #[test]
    fn checked_factory_demotes_missing_compiler() {
        let dir = tempfile::tempdir().unwrap();
        // No ModelSim on the test machine: expect a Fallback demotion.
        let (builder, demotion) =
            create_checked_builder(BuilderKind::Msim, dir.path()).unwrap();
        if demotion.is_some() {
            assert_eq!(builder.name(), "fallback");
        } else {
            assert_eq!(builder.name(), "msim");
        }
    }

    #[test]
    fn rebuild_hint_serde_roundtrip() {
        let hints = vec![
            RebuildHint::Path {
                path: PathBuf::from("/tmp/a.vhd"),
            },
            RebuildHint::Unit {
                library: Identifier::vhdl("work"),
                unit: Identifier::vhdl("pkg"),
            },
        ];
        let json = serde_json::to_string(&hints).unwrap();
        let back: Vec<RebuildHint> = serde_json::from_str(&json).unwrap();
        assert_eq!(hints, back);
    }
}
