//! The incremental project analyzer.
//!
//! A [`Project`] owns the configuration loader, the source database, and
//! the active compiler adapter. Editor-facing requests go through
//! [`Project::messages_for`]; a full dependency-ordered build runs on a
//! single background worker via [`Project::build_by_dependency`]. State is
//! persisted to `.hdlcheck.cache` so restarts are cheap.

pub mod order;
pub mod state;

pub use order::{compile_order, CompileOrder, MAX_BUILD_STEPS};
pub use state::{CacheError, PersistedState, CACHE_FILE_NAME, SCHEMA_VERSION};

use hdlcheck_builders::{create_builder, create_checked_builder, Builder, RebuildHint};
use hdlcheck_common::{CanonPath, FileType, Identifier};
use hdlcheck_config::{BuilderKind, ConfigError, ConfigLoader, FlagScope, ProjectConfig};
use hdlcheck_database::Database;
use hdlcheck_diagnostics::{
    sort_diagnostics, Diagnostic, Severity, UiMessage, UiQueue,
};
use log::{debug, info, warn};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// Name of the per-project work directory, next to the project file.
const WORK_DIR_NAME: &str = ".hdlcheck";

struct Inner {
    project_file: Option<PathBuf>,
    work_dir: PathBuf,
    loader: Mutex<Option<ConfigLoader>>,
    config: Mutex<Option<ProjectConfig>>,
    database: Mutex<Database>,
    builder: Mutex<Box<dyn Builder>>,
    ui: UiQueue,
    building: AtomicBool,
    halt: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
}

/// One analyzed HDL project. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Project {
    inner: Arc<Inner>,
}

impl Project {
    /// Creates a project for an optional project file and tries to recover
    /// persisted state from a previous run.
    pub fn new(project_file: Option<PathBuf>) -> io::Result<Self> {
        let work_dir = match &project_file {
            Some(file) => file
                .parent()
                .unwrap_or(Path::new("."))
                .join(WORK_DIR_NAME),
            None => std::env::temp_dir().join(WORK_DIR_NAME),
        };

        let builder = create_builder(BuilderKind::Fallback, &work_dir)?;
        let project = Self {
            inner: Arc::new(Inner {
                project_file,
                work_dir,
                loader: Mutex::new(None),
                config: Mutex::new(None),
                database: Mutex::new(Database::new()),
                builder: Mutex::new(builder),
                ui: UiQueue::new(),
                building: AtomicBool::new(false),
                halt: AtomicBool::new(false),
                worker: Mutex::new(None),
            }),
        };

        if let Some(file) = project.inner.project_file.clone() {
            *project.inner.loader.lock().unwrap() = Some(ConfigLoader::new(file));
            project.try_recover_cache();
        }
        Ok(project)
    }

    /// The configured project file, if any.
    pub fn project_file(&self) -> Option<&Path> {
        self.inner.project_file.as_deref()
    }

    /// The work directory holding compiler libraries and the cache file.
    pub fn work_dir(&self) -> &Path {
        &self.inner.work_dir
    }

    /// The active builder's name.
    pub fn builder_name(&self) -> String {
        self.inner.builder.lock().unwrap().name().to_string()
    }

    /// Drains queued UI messages.
    pub fn ui_messages(&self) -> Vec<UiMessage> {
        self.inner.ui.drain()
    }

    /// Loads (or reloads) the configuration and applies it. A no-op when
    /// the config content is unchanged.
    pub fn setup(&self) -> Result<(), ConfigError> {
        let config = {
            let mut loader = self.inner.loader.lock().unwrap();
            match loader.as_mut() {
                Some(loader) => loader.load()?.clone(),
                None => return Ok(()),
            }
        };

        let accepted = self.inner.config.lock().unwrap().as_ref().map(|c| c.content_hash);
        if accepted == Some(config.content_hash) {
            // Same content: keep the database and compile cache, but hold
            // on to the full parse (recovery stores only a stub).
            *self.inner.config.lock().unwrap() = Some(config);
            return Ok(());
        }

        info!("applying configuration (builder '{}')", config.builder);
        self.inner.database.lock().unwrap().accept(&config);

        // A changed config invalidates the compile cache wholesale: the
        // adapter is recreated with an empty one.
        match create_checked_builder(config.builder, &self.inner.work_dir) {
            Ok((builder, demotion)) => {
                if let Some(err) = demotion {
                    self.inner.ui.error(err.to_string());
                }
                *self.inner.builder.lock().unwrap() = builder;
            }
            Err(err) => {
                self.inner
                    .ui
                    .error(format!("failed to set up builder: {err}"));
            }
        }

        *self.inner.config.lock().unwrap() = Some(config);
        Ok(())
    }

    /// Returns all diagnostics for one path: static style checks merged
    /// with the configured compiler's output, rebuild hints resolved.
    pub fn messages_for(&self, path: &Path, batch: bool) -> Vec<Diagnostic> {
        if let Err(err) = self.setup() {
            self.inner.ui.error(format!("configuration error: {err}"));
        }

        let canon = CanonPath::new(path);
        let mut diagnostics: Vec<Diagnostic> = Vec::new();

        let in_project = self.inner.database.lock().unwrap().contains(&canon);
        if !in_project {
            info!("'{}' is not in the project file", canon);
            diagnostics.push(
                Diagnostic::warning(format!(
                    "Path \"{}\" not found in project file",
                    canon
                ))
                .with_path(canon.as_path()),
            );
        }

        // Static checks work off the raw text and need no compiler.
        match std::fs::read(canon.as_path()) {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes);
                for mut diag in hdlcheck_lint::static_messages(&text) {
                    diag.path = Some(canon.as_path().to_path_buf());
                    diagnostics.push(diag);
                }
            }
            Err(err) => {
                diagnostics.push(
                    Diagnostic::error(format!("could not read '{}': {err}", canon))
                        .with_path(canon.as_path()),
                );
            }
        }

        diagnostics.extend(self.builder_messages(&canon, batch));

        sort_diagnostics(&mut diagnostics);
        self.save_cache();
        diagnostics
    }

    /// Starts a dependency-ordered build of the whole project on the
    /// background worker. Returns `false` (and queues a UI notice) when a
    /// build is already running.
    pub fn build_by_dependency(&self) -> bool {
        if self.inner.building.swap(true, Ordering::SeqCst) {
            self.inner.ui.info("project is already building");
            return false;
        }

        let project = self.clone();
        let handle = std::thread::spawn(move || {
            project.run_full_build();
            project.inner.building.store(false, Ordering::SeqCst);
        });
        *self.inner.worker.lock().unwrap() = Some(handle);
        true
    }

    /// Runs a full dependency-ordered build synchronously, returning every
    /// diagnostic produced. The halt flag is honored between sources.
    pub fn run_full_build(&self) -> Vec<Diagnostic> {
        if let Err(err) = self.setup() {
            self.inner.ui.error(format!("configuration error: {err}"));
            return Vec::new();
        }

        let builtins = self.inner.builder.lock().unwrap().builtin_libraries();
        let schedule = {
            let mut database = self.inner.database.lock().unwrap();
            database.refresh_all();
            compile_order(&mut database, &builtins)
        };
        for note in &schedule.missing {
            self.inner.ui.warning(note.clone());
        }

        let mut diagnostics = schedule.advisories;
        for path in &schedule.order {
            if self.inner.halt.load(Ordering::SeqCst) {
                info!("halt requested, stopping build");
                break;
            }
            let (diags, _rebuilds) = self.build_one(path, false, true);
            diagnostics.extend(diags);
        }

        self.save_cache();
        self.inner.ui.info("build finished");
        diagnostics
    }

    /// Whether no background build is currently running.
    pub fn has_finished_building(&self) -> bool {
        !self.inner.building.load(Ordering::SeqCst)
    }

    /// Blocks until the background build (if any) finishes.
    pub fn wait_for_build(&self) {
        let handle = self.inner.worker.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.join();
            debug!("background build joined");
        }
    }

    /// Asks a pending background build to stop between sources.
    pub fn halt(&self) {
        self.inner.halt.store(true, Ordering::SeqCst);
    }

    /// Removes the persisted cache and the work directory.
    pub fn clean(&self) -> io::Result<()> {
        let cache = self.cache_file();
        if cache.exists() {
            std::fs::remove_file(&cache)?;
        }
        if self.inner.work_dir.exists() {
            std::fs::remove_dir_all(&self.inner.work_dir)?;
        }
        Ok(())
    }

    /// Human-readable project facts for the diagnose endpoint.
    pub fn diagnose_info(&self) -> Vec<String> {
        let mut info = vec![format!("Builder: {}", self.builder_name())];
        match &self.inner.project_file {
            Some(file) => info.push(format!("Project file: {}", file.display())),
            None => info.push("Project file: <none>".to_string()),
        }
        info
    }

    /// Persists the database and the builder's compile cache. Skipped for
    /// the fallback builder, which has nothing worth keeping.
    pub fn save_cache(&self) {
        let builder = self.inner.builder.lock().unwrap();
        if builder.name() == "fallback" {
            debug!("skipping cache save for fallback builder");
            return;
        }
        let kind = self
            .inner
            .config
            .lock()
            .unwrap()
            .as_ref()
            .map(|c| c.builder)
            .unwrap_or_default();
        let database = self.inner.database.lock().unwrap().clone();
        let hash = self
            .inner
            .config
            .lock()
            .unwrap()
            .as_ref()
            .map(|c| c.content_hash);
        let state = PersistedState::new(kind, builder.state(), hash, database);
        if let Err(err) = state.save(&self.cache_file()) {
            warn!("failed to save cache: {err}");
        }
    }

    fn cache_file(&self) -> PathBuf {
        self.inner.work_dir.join(CACHE_FILE_NAME)
    }

    /// Restores state from a previous run when the cache file is present,
    /// decodable, and schema-compatible. The builder's environment is
    /// re-checked; a failing probe demotes to the fallback adapter but
    /// never prevents startup.
    fn try_recover_cache(&self) {
        let cache = self.cache_file();
        if !cache.exists() {
            return;
        }
        let persisted = match PersistedState::load(&cache) {
            Ok(persisted) => persisted,
            Err(err) => {
                warn!("discarding cache '{}': {err}", cache.display());
                let _ = std::fs::remove_file(&cache);
                return;
            }
        };

        info!("recovered state from '{}'", cache.display());
        match create_checked_builder(persisted.builder_name, &self.inner.work_dir) {
            Ok((builder, demotion)) => {
                match demotion {
                    Some(err) => self.inner.ui.error(err.to_string()),
                    None => builder.restore_state(persisted.builder_state),
                }
                *self.inner.builder.lock().unwrap() = builder;
            }
            Err(err) => {
                self.inner
                    .ui
                    .error(format!("failed to restore builder: {err}"));
                return;
            }
        }
        *self.inner.database.lock().unwrap() = persisted.database;

        // Remember the hash the recovered database corresponds to so
        // setup() can skip re-accepting an unchanged config.
        if let Some(hash) = persisted.config_hash {
            let mut config = ProjectConfig::empty(hash);
            config.builder = persisted.builder_name;
            *self.inner.config.lock().unwrap() = Some(config);
        }
    }

    /// Compiler-side diagnostics for a path: the dependency pre-pass, the
    /// forced build, and rebuild-hint chasing with the round guard.
    fn builder_messages(&self, canon: &CanonPath, batch: bool) -> Vec<Diagnostic> {
        let builtins = self.inner.builder.lock().unwrap().builtin_libraries();
        let mut diagnostics = Vec::new();

        // Warn about references that resolve nowhere and about ambiguous
        // definitions before anything is compiled.
        diagnostics.extend(self.unresolved_dependency_diagnostics(canon, &builtins));

        // Build the transitive dependencies first, in schedule order.
        let dep_order: Vec<CanonPath> = {
            let mut database = self.inner.database.lock().unwrap();
            let wanted = database.dependency_paths(canon, &builtins);
            if wanted.is_empty() {
                Vec::new()
            } else {
                compile_order(&mut database, &builtins)
                    .order
                    .into_iter()
                    .filter(|p| wanted.contains(p))
                    .collect()
            }
        };

        let mut rounds = 0usize;
        for dep in &dep_order {
            let (diags, rebuilds) = self.build_one(dep, false, false);
            diagnostics.extend(diags);
            self.chase_hints(rebuilds, &mut rounds);
        }

        // Force-build the target, then re-build it after every round of
        // rebuild hints until the compiler stops asking.
        loop {
            let (diags, rebuilds) = self.build_one(canon, true, batch);
            if rebuilds.is_empty() || rounds >= MAX_BUILD_STEPS {
                if rounds >= MAX_BUILD_STEPS && !rebuilds.is_empty() {
                    self.inner.ui.error(format!(
                        "rebuild limit of {MAX_BUILD_STEPS} rounds exceeded while building '{canon}'"
                    ));
                }
                diagnostics.extend(diags);
                break;
            }
            self.chase_hints(rebuilds, &mut rounds);
        }

        diagnostics
    }

    /// Recursively rebuilds everything the compiler hinted at, bounded by
    /// the shared round counter. Diagnostics from the intermediate builds
    /// stay in the compile cache; the caller's final build reports them.
    fn chase_hints(&self, hints: Vec<RebuildHint>, rounds: &mut usize) {
        for hint in hints {
            if *rounds >= MAX_BUILD_STEPS {
                self.inner.ui.error(format!(
                    "rebuild limit of {MAX_BUILD_STEPS} rounds exceeded"
                ));
                return;
            }
            *rounds += 1;

            let targets: Vec<CanonPath> = match &hint {
                RebuildHint::Path { path } => vec![CanonPath::new(path)],
                RebuildHint::Unit { library, unit } => {
                    let database = self.inner.database.lock().unwrap();
                    database.resolve(library, unit)
                }
            };
            if targets.is_empty() {
                warn!("rebuild hint {hint:?} matched no sources");
                continue;
            }
            debug!("rebuild hint {hint:?} -> {} source(s)", targets.len());
            for target in targets {
                let (_diags, rebuilds) = self.build_one(&target, true, true);
                self.chase_hints(rebuilds, rounds);
            }
        }
    }

    /// `DesignUnitNotFound` warnings plus a UI notice for units defined in
    /// more than one file.
    fn unresolved_dependency_diagnostics(
        &self,
        canon: &CanonPath,
        builtins: &[Identifier],
    ) -> Vec<Diagnostic> {
        let mut database = self.inner.database.lock().unwrap();
        let library = match database.library_of(canon) {
            Some(library) => library.clone(),
            None => return Vec::new(),
        };
        let mut diagnostics = Vec::new();
        for dep in database.resolved_dependencies_of(canon, builtins) {
            let target_library = dep.library_or(&library).clone();
            let candidates = database.resolve(&target_library, &dep.name);
            match candidates.len() {
                0 => {
                    let mut diag = Diagnostic::warning(format!(
                        "design unit '{}.{}' not found",
                        target_library, dep.name
                    ))
                    .with_path(canon.as_path());
                    if let Some(location) = dep.locations.iter().next() {
                        diag.line = Some(location.line);
                        diag.column = Some(location.column);
                    }
                    diagnostics.push(diag);
                }
                1 => {}
                n => {
                    self.inner.ui.warning(format!(
                        "'{}.{}' is defined in {} files; using '{}'",
                        target_library, dep.name, n, candidates[0]
                    ));
                }
            }
        }
        diagnostics
    }

    /// Builds one source through the adapter, composing the effective flag
    /// layers for its language and scope.
    fn build_one(
        &self,
        canon: &CanonPath,
        forced: bool,
        batch: bool,
    ) -> (Vec<Diagnostic>, Vec<RebuildHint>) {
        let (library, file_flags, file_type) = {
            let database = self.inner.database.lock().unwrap();
            (
                database.library_of(canon).cloned(),
                database.flags_of(canon).to_vec(),
                database.file_type_of(canon),
            )
        };
        // Paths outside the project still build, into a throwaway library.
        let library = library.unwrap_or_else(|| Identifier::vhdl("undefined"));
        let file_type = file_type
            .or_else(|| FileType::from_path(canon.as_path()).ok())
            .unwrap_or(FileType::Vhdl);

        let scope = if batch { FlagScope::Batch } else { FlagScope::Single };
        let extra_flags = self
            .inner
            .config
            .lock()
            .unwrap()
            .as_ref()
            .map(|config| config.effective_flags(file_type, scope, &[]))
            .unwrap_or_default();

        let builder = self.inner.builder.lock().unwrap();
        builder.build(&hdlcheck_builders::BuildRequest {
            path: canon,
            library: &library,
            forced,
            file_flags: &file_flags,
            extra_flags: &extra_flags,
        })
    }
}

/// True when any diagnostic in the slice is an error; drives the CLI exit
/// code.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(|d| d.severity == Severity::Error)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_project(
        dir: &Path,
        files: &[(&str, &str)],
        header: &str,
    ) -> PathBuf {
        let mut config_text = String::from(header);
        for (name, contents) in files {
            std::fs::write(dir.join(name), contents).unwrap();
            config_text.push_str(&format!("vhdl lib {name}\n"));
        }
        let config_path = dir.join("project.prj");
        std::fs::write(&config_path, config_text).unwrap();
        config_path
    }

    #[test]
    fn no_project_file_still_lints() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.vhd");
        std::fs::write(
            &source,
            "architecture rtl of foo is\n  signal unused : std_logic;\nbegin\nend;\n",
        )
        .unwrap();

        let project = Project::new(None).unwrap();
        let diags = project.messages_for(&source, false);
        assert!(diags
            .iter()
            .any(|d| d.text == "signal 'unused' is never used"));
    }

    #[test]
    fn out_of_project_path_gets_a_synthetic_warning() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_project(dir.path(), &[], "");
        let stray = dir.path().join("stray.vhd");
        std::fs::write(&stray, "entity stray is\nend;\n").unwrap();

        let project = Project::new(Some(config)).unwrap();
        let diags = project.messages_for(&stray, false);
        assert!(diags
            .iter()
            .any(|d| d.text.contains("not found in project file")));
    }

    #[test]
    fn header_only_config_yields_empty_project() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_project(dir.path(), &[], "builder = fallback\n# nothing else\n");
        let project = Project::new(Some(config)).unwrap();
        project.setup().unwrap();
        assert_eq!(project.builder_name(), "fallback");

        let stray = dir.path().join("anything.vhd");
        std::fs::write(&stray, "entity anything is\nend;\n").unwrap();
        let diags = project.messages_for(&stray, false);
        assert!(diags
            .iter()
            .any(|d| d.text.contains("not found in project file")));
    }

    #[test]
    fn missing_design_unit_produces_warning_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_project(
            dir.path(),
            &[("top.vhd", "use work.ghost_pkg.all;\nentity top is\nend;\n")],
            "",
        );
        let project = Project::new(Some(config)).unwrap();
        let diags = project.messages_for(&dir.path().join("top.vhd"), false);
        let warning = diags
            .iter()
            .find(|d| d.text.contains("ghost_pkg"))
            .expect("expected a design-unit-not-found warning");
        assert_eq!(warning.severity, Severity::Warning);
        assert_eq!(warning.line, Some(1));
    }

    #[test]
    fn duplicate_definitions_emit_one_ui_warning() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_project(
            dir.path(),
            &[
                ("user.vhd", "use work.twice.all;\nentity user is\nend;\n"),
                ("one.vhd", "package twice is\nend;\n"),
                ("two.vhd", "package twice is\nend;\n"),
            ],
            "",
        );
        let project = Project::new(Some(config)).unwrap();
        let _ = project.messages_for(&dir.path().join("user.vhd"), false);
        let ui = project.ui_messages();
        assert!(ui.iter().any(|m| m.text.contains("defined in 2 files")));
    }

    #[test]
    fn messages_are_stable_across_calls() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_project(
            dir.path(),
            &[(
                "a.vhd",
                "architecture rtl of a is\n  signal s : std_logic;\nbegin\nend;\n",
            )],
            "",
        );
        let project = Project::new(Some(config)).unwrap();
        let path = dir.path().join("a.vhd");
        let first = project.messages_for(&path, false);
        let second = project.messages_for(&path, false);
        assert_eq!(first, second);
    }

    #[test]
    fn build_by_dependency_runs_once_at_a_time() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_project(dir.path(), &[("a.vhd", "entity a is\nend;\n")], "");
        let project = Project::new(Some(config)).unwrap();

        assert!(project.build_by_dependency());
        // The worker may or may not have finished; a second start while
        // running must refuse. Either way the project settles.
        let _second = project.build_by_dependency();
        project.wait_for_build();
        while !project.has_finished_building() {
            std::thread::yield_now();
        }
        assert!(project.has_finished_building());
    }

    #[test]
    fn run_full_build_reports_finished() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_project(dir.path(), &[("a.vhd", "entity a is\nend;\n")], "");
        let project = Project::new(Some(config)).unwrap();
        let diags = project.run_full_build();
        assert!(!has_errors(&diags));
        assert!(project
            .ui_messages()
            .iter()
            .any(|m| m.text.contains("build finished")));
    }

    #[test]
    fn diagnose_info_names_the_builder() {
        let project = Project::new(None).unwrap();
        let info = project.diagnose_info();
        assert!(info.iter().any(|line| line.contains("fallback")));
    }

    #[test]
    fn clean_removes_the_work_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_project(dir.path(), &[("a.vhd", "entity a is\nend;\n")], "");
        let project = Project::new(Some(config)).unwrap();
        project.setup().unwrap();
        assert!(project.work_dir().exists());
        project.clean().unwrap();
        assert!(!project.work_dir().exists());
    }

    #[test]
    fn rebuild_hint_loops_stop_at_the_round_limit() {
        use hdlcheck_builders::{BuildCore, BuildRequest};
        use hdlcheck_diagnostics::Diagnostic;

        // An adapter that always asks for its own source to be rebuilt.
        struct Looping {
            core: BuildCore,
        }
        impl Builder for Looping {
            fn name(&self) -> &'static str {
                "looping"
            }
            fn core(&self) -> &BuildCore {
                &self.core
            }
            fn check_environment(
                &self,
            ) -> std::result::Result<String, hdlcheck_builders::SanityCheckError> {
                Ok("1.0".to_string())
            }
            fn builtin_libraries(&self) -> Vec<Identifier> {
                Vec::new()
            }
            fn file_types(&self) -> Vec<FileType> {
                vec![FileType::Vhdl]
            }
            fn create_library(&self, _library: &Identifier) -> io::Result<()> {
                Ok(())
            }
            fn compile(&self, _request: &BuildRequest<'_>) -> io::Result<Vec<String>> {
                Ok(vec!["REBUILD".to_string()])
            }
            fn ignore_line(&self, _line: &str) -> bool {
                false
            }
            fn parse_diagnostic_line(&self, _line: &str) -> Vec<Diagnostic> {
                Vec::new()
            }
            fn parse_rebuild_hint_line(&self, line: &str) -> Vec<RebuildHint> {
                if line == "REBUILD" {
                    vec![RebuildHint::Unit {
                        library: Identifier::vhdl("lib"),
                        unit: Identifier::vhdl("loop_pkg"),
                    }]
                } else {
                    Vec::new()
                }
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let config = write_project(dir.path(), &[("a.vhd", "package loop_pkg is\nend;\n")], "");
        let project = Project::new(Some(config)).unwrap();
        project.setup().unwrap();
        *project.inner.builder.lock().unwrap() = Box::new(Looping {
            core: BuildCore::new(project.work_dir()),
        });

        // Must terminate despite the self-referential hint and surface the
        // limit as a UI error.
        let _ = project.messages_for(&dir.path().join("a.vhd"), false);
        assert!(project
            .ui_messages()
            .iter()
            .any(|m| m.text.contains("rebuild limit")));
    }

    #[test]
    fn config_error_surfaces_as_ui_error() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("project.prj");
        std::fs::write(&config_path, "bogus_parameter = 1\n").unwrap();
        let source = dir.path().join("a.vhd");
        std::fs::write(&source, "entity a is\nend;\n").unwrap();

        let project = Project::new(Some(config_path)).unwrap();
        assert!(project.setup().is_err());
        let _ = project.messages_for(&source, false);
        assert!(project
            .ui_messages()
            .iter()
            .any(|m| m.text.contains("configuration error")));
    }
}
