//! The build flow shared by every compiler adapter.

use crate::{Builder, RebuildHint};
use hdlcheck_common::{CanonPath, Identifier};
use hdlcheck_diagnostics::{Diagnostic, Severity};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

/// One build request from the scheduler.
#[derive(Debug)]
pub struct BuildRequest<'a> {
    /// Source to compile.
    pub path: &'a CanonPath,
    /// Library the source belongs to.
    pub library: &'a Identifier,
    /// Skip the compile-time cache check when set.
    pub forced: bool,
    /// The source's own flags.
    pub file_flags: &'a [String],
    /// Flags supplied by the caller (global + scope layers).
    pub extra_flags: &'a [String],
}

impl BuildRequest<'_> {
    /// The effective flag list: caller-supplied layers first, then the
    /// file's own flags, de-duplicated while preserving order.
    pub fn effective_flags(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for flag in self.extra_flags.iter().chain(self.file_flags) {
            if seen.insert(flag.clone()) {
                out.push(flag.clone());
            }
        }
        out
    }
}

/// Memoized result of the most recent compile of one path.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct BuildCacheEntry {
    /// Source mtime the cached result corresponds to. The epoch means
    /// "must rebuild".
    pub compile_time: SystemTime,
    /// Diagnostics from that compile.
    pub diagnostics: Vec<Diagnostic>,
    /// Rebuild hints from that compile.
    pub rebuilds: Vec<RebuildHint>,
}

impl Default for BuildCacheEntry {
    fn default() -> Self {
        Self {
            compile_time: SystemTime::UNIX_EPOCH,
            diagnostics: Vec::new(),
            rebuilds: Vec::new(),
        }
    }
}

/// Per-path compile cache.
pub type BuildCache = HashMap<PathBuf, BuildCacheEntry>;

/// Serializable snapshot of an adapter's compile cache.
#[derive(Clone, Default, PartialEq, Debug, Serialize, Deserialize)]
pub struct BuilderState {
    /// Cached compile results keyed by source path.
    pub cache: BuildCache,
}

/// Shared state embedded in every adapter.
///
/// The shell mutex serializes subprocess invocations: the external
/// compilers are not internally concurrent-safe, and the per-path cache is
/// only written while holding it.
pub struct BuildCore {
    work_dir: PathBuf,
    cache: Mutex<BuildCache>,
    shell: Mutex<()>,
    cache_error_messages: bool,
}

impl BuildCore {
    /// Creates a build core rooted at the adapter's work directory.
    pub fn new(work_dir: &Path) -> Self {
        Self {
            work_dir: work_dir.to_path_buf(),
            cache: Mutex::new(HashMap::new()),
            shell: Mutex::new(()),
            cache_error_messages: false,
        }
    }

    /// The adapter's work directory.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// When enabled, results containing error diagnostics stay cached
    /// instead of forcing a rebuild on the next request.
    pub fn set_cache_error_messages(&mut self, enabled: bool) {
        self.cache_error_messages = enabled;
    }

    /// The shared `build` flow; see the trait documentation.
    pub fn run_build(
        &self,
        builder: &(impl Builder + ?Sized),
        request: &BuildRequest<'_>,
    ) -> (Vec<Diagnostic>, Vec<RebuildHint>) {
        let mtime = request
            .path
            .mtime()
            .unwrap_or_else(|_| SystemTime::now());

        if !request.forced {
            let cache = self.cache.lock().unwrap();
            if let Some(entry) = cache.get(request.path.as_path()) {
                if mtime <= entry.compile_time {
                    debug!("nothing to do for {}", request.path);
                    return (entry.diagnostics.clone(), entry.rebuilds.clone());
                }
            }
        }

        info!("building {}", request.path);
        let lines = {
            let _shell = self.shell.lock().unwrap();
            match builder
                .create_library(request.library)
                .and_then(|_| builder.compile(request))
            {
                Ok(lines) => lines,
                Err(err) => {
                    // The tool could not even be invoked; report that as a
                    // diagnostic and leave the entry dirty so the next
                    // request retries.
                    let diag = Diagnostic::error(format!(
                        "failed to run {}: {err}",
                        builder.name()
                    ))
                    .with_checker(builder.name())
                    .with_path(request.path.as_path());
                    let mut cache = self.cache.lock().unwrap();
                    cache.insert(
                        request.path.as_path().to_path_buf(),
                        BuildCacheEntry {
                            compile_time: SystemTime::UNIX_EPOCH,
                            diagnostics: vec![diag.clone()],
                            rebuilds: Vec::new(),
                        },
                    );
                    return (vec![diag], Vec::new());
                }
            }
        };

        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let mut rebuilds: Vec<RebuildHint> = Vec::new();
        for line in &lines {
            if builder.ignore_line(line) {
                continue;
            }
            for mut diag in builder.parse_diagnostic_line(line) {
                if diag.path.is_none() {
                    diag.path = Some(request.path.as_path().to_path_buf());
                }
                if !diagnostics.contains(&diag) {
                    diagnostics.push(diag);
                }
            }
            for hint in builder.parse_rebuild_hint_line(line) {
                let hint = rewrite_work_hint(hint, request.library);
                if !rebuilds.contains(&hint) {
                    rebuilds.push(hint);
                }
            }
        }

        let has_errors = diagnostics.iter().any(|d| d.severity == Severity::Error);
        let compile_time = if has_errors && !self.cache_error_messages {
            SystemTime::UNIX_EPOCH
        } else {
            mtime
        };

        let mut cache = self.cache.lock().unwrap();
        cache.insert(
            request.path.as_path().to_path_buf(),
            BuildCacheEntry {
                compile_time,
                diagnostics: diagnostics.clone(),
                rebuilds: rebuilds.clone(),
            },
        );

        (diagnostics, rebuilds)
    }

    /// Snapshot of the compile cache.
    pub fn state(&self) -> BuilderState {
        BuilderState {
            cache: self.cache.lock().unwrap().clone(),
        }
    }

    /// Replaces the compile cache with a persisted snapshot.
    pub fn restore_state(&self, state: BuilderState) {
        *self.cache.lock().unwrap() = state.cache;
    }
}

/// `work` in a rebuild hint means "the library of the source being built".
fn rewrite_work_hint(hint: RebuildHint, library: &Identifier) -> RebuildHint {
    match hint {
        RebuildHint::Unit { library: lib, unit } if lib.name().eq_ignore_ascii_case("work") => {
            RebuildHint::Unit {
                library: library.clone(),
                unit,
            }
        }
        other => other,
    }
}
