//! The line-oriented project-file parser.

use crate::error::ConfigError;
use crate::types::{BuilderKind, FlagScope, ProjectConfig, SourceSpec};
use hdlcheck_common::{CanonPath, ContentHash, FileType, Identifier};
use log::{debug, info, warn};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::SystemTime;

static PARAMETER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\w+)\s*(?:\[\s*(vhdl|verilog|systemverilog)\s*\])?\s*=\s*(.*?)\s*$")
        .unwrap()
});
static SOURCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(vhdl|verilog|systemverilog)\s+(\w+)\s+(\S+)\s*(.*?)\s*$").unwrap()
});

/// Loads a project file, re-parsing only when its mtime advances.
pub struct ConfigLoader {
    path: PathBuf,
    seen_mtime: Option<SystemTime>,
    cached: Option<ProjectConfig>,
}

impl ConfigLoader {
    /// Creates a loader for the given project file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seen_mtime: None,
            cached: None,
        }
    }

    /// The project file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the parsed configuration, reading the file only when it has
    /// changed since the last call.
    pub fn load(&mut self) -> Result<&ProjectConfig, ConfigError> {
        let mtime = std::fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .map_err(|source| ConfigError::Io {
                path: self.path.clone(),
                source,
            })?;

        let stale = match (self.seen_mtime, &self.cached) {
            (Some(seen), Some(_)) => mtime > seen,
            _ => true,
        };
        if stale {
            info!("parsing project file '{}'", self.path.display());
            let bytes = std::fs::read(&self.path).map_err(|source| ConfigError::Io {
                path: self.path.clone(),
                source,
            })?;
            let text = String::from_utf8_lossy(&bytes);
            let config = parse_config(&self.path, &text, ContentHash::from_bytes(&bytes))?;
            self.cached = Some(config);
            self.seen_mtime = Some(mtime);
        }

        Ok(self.cached.as_ref().unwrap())
    }
}

/// Parses project-file text. `config_path` anchors relative source paths.
pub fn parse_config(
    config_path: &Path,
    text: &str,
    content_hash: ContentHash,
) -> Result<ProjectConfig, ConfigError> {
    let base_dir = config_path.parent().unwrap_or(Path::new("."));
    let mut config = ProjectConfig::empty(content_hash);
    let mut include_dirs: BTreeSet<PathBuf> = BTreeSet::new();

    for raw_line in text.lines() {
        let line = strip_comment(raw_line);
        if line.trim().is_empty() {
            continue;
        }

        if let Some(cap) = PARAMETER_RE.captures(line) {
            let parameter = cap[1].to_lowercase();
            let lang = cap.get(2).map(|m| m.as_str().to_lowercase());
            let value = &cap[3];
            handle_parameter(&mut config, &parameter, lang.as_deref(), value)?;
        } else if let Some(cap) = SOURCE_RE.captures(line) {
            let file_type = FileType::from_lang(&cap[1]).unwrap();
            let library = &cap[2];
            let flags = split_flags(&cap[4]);
            for path in expand_paths(base_dir, &cap[3]) {
                add_source(&mut config, &mut include_dirs, path, file_type, library, &flags);
            }
        } else {
            debug!("ignoring unrecognized line: '{}'", line.trim());
        }
    }

    // Header directories become include flags for the Verilog dialects.
    for dir in include_dirs {
        let flag = format!("+incdir+{}", dir.display());
        for file_type in [FileType::Verilog, FileType::SystemVerilog] {
            let global = config
                .flags
                .entry(file_type)
                .or_default()
                .entry(FlagScope::Global)
                .or_default();
            if !global.contains(&flag) {
                global.push(flag.clone());
            }
        }
    }

    Ok(config)
}

fn handle_parameter(
    config: &mut ProjectConfig,
    parameter: &str,
    lang: Option<&str>,
    value: &str,
) -> Result<(), ConfigError> {
    match parameter {
        "builder" => {
            config.builder = BuilderKind::from_name(value)
                .ok_or_else(|| ConfigError::UnknownBuilder(value.to_string()))?;
        }
        "single_build_flags" | "batch_build_flags" | "global_build_flags" => {
            let scope = match parameter {
                "single_build_flags" => FlagScope::Single,
                "batch_build_flags" => FlagScope::Batch,
                _ => FlagScope::Global,
            };
            let file_type = lang
                .and_then(FileType::from_lang)
                .ok_or_else(|| ConfigError::MissingLanguage(parameter.to_string()))?;
            config
                .flags
                .entry(file_type)
                .or_default()
                .insert(scope, split_flags(value));
        }
        "target_dir" => {
            debug!("ignoring deprecated parameter 'target_dir'");
        }
        other => return Err(ConfigError::UnknownParameter(other.to_string())),
    }
    Ok(())
}

fn add_source(
    config: &mut ProjectConfig,
    include_dirs: &mut BTreeSet<PathBuf>,
    path: PathBuf,
    file_type: FileType,
    library: &str,
    flags: &[String],
) {
    if FileType::is_header(&path) {
        if let Some(dir) = path.parent() {
            include_dirs.insert(dir.to_path_buf());
        }
        return;
    }
    if FileType::from_path(&path).is_err() {
        warn!("skipping non-HDL file '{}'", path.display());
        return;
    }
    config.sources.push(SourceSpec {
        path: CanonPath::new(&path),
        library: Identifier::new(library, file_type.case_sensitive()),
        file_type,
        flags: flags.to_vec(),
    });
}

/// Expands a possibly-relative, possibly-globbed path spec. A glob with no
/// matches falls back to the literal path.
fn expand_paths(base_dir: &Path, spec: &str) -> Vec<PathBuf> {
    let joined = if Path::new(spec).is_absolute() {
        PathBuf::from(spec)
    } else {
        base_dir.join(spec)
    };
    let pattern = joined.to_string_lossy();
    match glob::glob(&pattern) {
        Ok(matches) => {
            let found: Vec<PathBuf> = matches.filter_map(Result::ok).collect();
            if found.is_empty() {
                vec![joined]
            } else {
                found
            }
        }
        Err(_) => vec![joined],
    }
}

fn split_flags(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}
