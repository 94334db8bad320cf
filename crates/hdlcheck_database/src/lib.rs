//! The authoritative per-path project state.
//!
//! The database keeps two plain tables (path → design units, path →
//! dependencies) joined by a `(library, unit)` name index; no pointer
//! cycles exist at the data-structure level. Reparsing is driven solely by
//! file modification times: a path's units and dependencies are recomputed
//! iff its mtime exceeds the cached value.

use hdlcheck_common::{CanonPath, FileType, Identifier};
use hdlcheck_config::ProjectConfig;
use hdlcheck_parsers::{parse_source, DependencySpec, DesignUnit, ParseResult};
use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::time::SystemTime;

/// Per-source state tracked by the database.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SourceEntry {
    /// Library the source is assigned to.
    pub library: Identifier,
    /// Language of the source.
    pub file_type: FileType,
    /// Per-file build flags.
    pub flags: Vec<String>,
    /// Mtime at which the cached parse data was computed.
    /// `UNIX_EPOCH` means "never parsed".
    pub seen_mtime: SystemTime,
    /// Cached design units.
    pub design_units: Vec<DesignUnit>,
    /// Cached dependencies.
    pub dependencies: Vec<DependencySpec>,
}

/// Index of paths, design units, and dependencies for one project.
#[derive(Clone, Default, PartialEq, Debug, Serialize, Deserialize)]
pub struct Database {
    entries: HashMap<CanonPath, SourceEntry>,
    #[serde(skip)]
    unit_index: HashMap<(Identifier, Identifier), BTreeSet<CanonPath>>,
}

impl Database {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all content with entries derived from the config.
    ///
    /// Mtimes are seeded to the epoch so every path is reparsed on first
    /// touch. Retention of any per-path build cache across an `accept` is
    /// the caller's concern, gated on the config's content hash.
    pub fn accept(&mut self, config: &ProjectConfig) {
        self.entries.clear();
        self.unit_index.clear();
        for source in &config.sources {
            debug!("adding {} to library '{}'", source.path, source.library);
            self.entries.insert(
                source.path.clone(),
                SourceEntry {
                    library: source.library.clone(),
                    file_type: source.file_type,
                    flags: source.flags.clone(),
                    seen_mtime: SystemTime::UNIX_EPOCH,
                    design_units: Vec::new(),
                    dependencies: Vec::new(),
                },
            );
        }
    }

    /// All known paths, sorted for deterministic iteration.
    pub fn paths(&self) -> Vec<CanonPath> {
        let mut paths: Vec<CanonPath> = self.entries.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Whether the path is part of the project.
    pub fn contains(&self, path: &CanonPath) -> bool {
        self.entries.contains_key(path)
    }

    /// The library assigned to a path.
    pub fn library_of(&self, path: &CanonPath) -> Option<&Identifier> {
        self.entries.get(path).map(|e| &e.library)
    }

    /// The per-file flags of a path.
    pub fn flags_of(&self, path: &CanonPath) -> &[String] {
        self.entries
            .get(path)
            .map(|e| e.flags.as_slice())
            .unwrap_or(&[])
    }

    /// The language of a path.
    pub fn file_type_of(&self, path: &CanonPath) -> Option<FileType> {
        self.entries.get(path).map(|e| e.file_type)
    }

    /// Design units declared by a path, reparsing on demand.
    pub fn design_units_of(&mut self, path: &CanonPath) -> Vec<DesignUnit> {
        self.reparse_if_needed(path);
        self.entries
            .get(path)
            .map(|e| e.design_units.clone())
            .unwrap_or_default()
    }

    /// Dependencies referenced by a path, reparsing on demand.
    pub fn dependencies_of(&mut self, path: &CanonPath) -> Vec<DependencySpec> {
        self.reparse_if_needed(path);
        self.entries
            .get(path)
            .map(|e| e.dependencies.clone())
            .unwrap_or_default()
    }

    /// Reparses every stale path in parallel. The parser is pure over file
    /// bytes, so distinct files can be scanned concurrently.
    pub fn refresh_all(&mut self) {
        let stale: Vec<(CanonPath, FileType, Identifier)> = self
            .entries
            .iter()
            .filter_map(|(path, entry)| {
                is_stale(path, entry)
                    .then(|| (path.clone(), entry.file_type, entry.library.clone()))
            })
            .collect();

        let results: Vec<(CanonPath, ParseResult)> = stale
            .par_iter()
            .filter_map(|(path, file_type, library)| {
                match parse_source(path, *file_type, library) {
                    Ok(result) => Some((path.clone(), result)),
                    Err(err) => {
                        warn!("failed to parse '{}': {}", path, err);
                        None
                    }
                }
            })
            .collect();

        for (path, result) in results {
            self.store_parse_result(&path, result);
        }
    }

    /// Sources defining `library.unit`, sorted by path so callers that must
    /// pick one do so deterministically.
    pub fn resolve(&self, library: &Identifier, unit: &Identifier) -> Vec<CanonPath> {
        self.unit_index
            .get(&(library.clone(), unit.clone()))
            .map(|paths| paths.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Dependencies of `path` that actually need resolving: references into
    /// built-in libraries, the pseudo-unit `all`, and units the file itself
    /// defines are dropped.
    pub fn resolved_dependencies_of(
        &mut self,
        path: &CanonPath,
        builtins: &[Identifier],
    ) -> Vec<DependencySpec> {
        let dependencies = self.dependencies_of(path);
        let entry = match self.entries.get(path) {
            Some(entry) => entry,
            None => return Vec::new(),
        };
        let own_library = entry.library.clone();
        let own_units: BTreeSet<&Identifier> =
            entry.design_units.iter().map(|u| &u.name).collect();

        dependencies
            .into_iter()
            .filter(|dep| {
                let library = dep.library_or(&own_library);
                if builtins.contains(library) {
                    return false;
                }
                if dep.name.name().eq_ignore_ascii_case("all") {
                    return false;
                }
                if library == &own_library && own_units.contains(&dep.name) {
                    return false;
                }
                true
            })
            .collect()
    }

    /// Transitive closure of the paths `path` depends on, excluding itself.
    pub fn dependency_paths(
        &mut self,
        path: &CanonPath,
        builtins: &[Identifier],
    ) -> BTreeSet<CanonPath> {
        let mut seen: BTreeSet<CanonPath> = BTreeSet::new();
        let mut queue: VecDeque<CanonPath> = VecDeque::from([path.clone()]);
        while let Some(current) = queue.pop_front() {
            let own_library = match self.library_of(&current) {
                Some(library) => library.clone(),
                None => continue,
            };
            for dep in self.resolved_dependencies_of(&current, builtins) {
                let library = dep.library_or(&own_library).clone();
                for candidate in self.resolve(&library, &dep.name) {
                    if candidate != *path && seen.insert(candidate.clone()) {
                        queue.push_back(candidate);
                    }
                }
            }
        }
        seen
    }

    /// Rebuilds the name index from the entry table. Must be called after
    /// deserializing a database.
    pub fn rebuild_index(&mut self) {
        self.unit_index.clear();
        let index_entries: Vec<(Identifier, Identifier, CanonPath)> = self
            .entries
            .iter()
            .flat_map(|(path, entry)| {
                entry
                    .design_units
                    .iter()
                    .map(|unit| (entry.library.clone(), unit.name.clone(), path.clone()))
            })
            .collect();
        for (library, name, path) in index_entries {
            self.unit_index
                .entry((library, name))
                .or_default()
                .insert(path);
        }
    }

    fn reparse_if_needed(&mut self, path: &CanonPath) {
        let entry = match self.entries.get(path) {
            Some(entry) => entry,
            None => return,
        };
        if !is_stale(path, entry) {
            return;
        }
        let file_type = entry.file_type;
        let library = entry.library.clone();
        debug!("parsing '{}'", path);
        match parse_source(path, file_type, &library) {
            Ok(result) => self.store_parse_result(path, result),
            Err(err) => warn!("failed to parse '{}': {}", path, err),
        }
    }

    fn store_parse_result(&mut self, path: &CanonPath, result: ParseResult) {
        let (library, old_names) = match self.entries.get(path) {
            Some(entry) => (
                entry.library.clone(),
                entry
                    .design_units
                    .iter()
                    .map(|u| u.name.clone())
                    .collect::<Vec<_>>(),
            ),
            None => return,
        };

        // Drop the old units from the name index before replacing them.
        for name in old_names {
            let key = (library.clone(), name);
            if let Some(paths) = self.unit_index.get_mut(&key) {
                paths.remove(path);
                if paths.is_empty() {
                    self.unit_index.remove(&key);
                }
            }
        }

        let new_names: Vec<Identifier> =
            result.design_units.iter().map(|u| u.name.clone()).collect();
        if let Some(entry) = self.entries.get_mut(path) {
            entry.seen_mtime = path.mtime().unwrap_or(SystemTime::UNIX_EPOCH);
            entry.design_units = result.design_units;
            entry.dependencies = result.dependencies;
        }
        for name in new_names {
            self.unit_index
                .entry((library.clone(), name))
                .or_default()
                .insert(path.clone());
        }
    }
}

fn is_stale(path: &CanonPath, entry: &SourceEntry) -> bool {
    match path.mtime() {
        Ok(mtime) => mtime > entry.seen_mtime,
        Err(_) => false,
    }
}
