//! Parsed configuration data.

use hdlcheck_common::{CanonPath, ContentHash, FileType, Identifier};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Which external compiler drives the project.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuilderKind {
    /// ModelSim (`vcom`).
    Msim,
    /// Xilinx Vivado (`xvhdl`).
    Xvhdl,
    /// GHDL.
    Ghdl,
    /// No real compiler; static checks only.
    #[default]
    Fallback,
}

impl BuilderKind {
    /// Parses the `builder =` parameter value.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "msim" => Some(BuilderKind::Msim),
            "xvhdl" => Some(BuilderKind::Xvhdl),
            "ghdl" => Some(BuilderKind::Ghdl),
            "fallback" => Some(BuilderKind::Fallback),
            _ => None,
        }
    }
}

impl fmt::Display for BuilderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuilderKind::Msim => write!(f, "msim"),
            BuilderKind::Xvhdl => write!(f, "xvhdl"),
            BuilderKind::Ghdl => write!(f, "ghdl"),
            BuilderKind::Fallback => write!(f, "fallback"),
        }
    }
}

/// Scope of a build-flag parameter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagScope {
    /// Flags for on-demand, single-file builds.
    Single,
    /// Flags for dependency-ordered batch builds.
    Batch,
    /// Flags applied in both modes.
    Global,
}

/// One compile unit from the project file.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Absolute path.
    pub path: CanonPath,
    /// Assigned library.
    pub library: Identifier,
    /// Language, as declared on the source line.
    pub file_type: FileType,
    /// Per-file flags.
    pub flags: Vec<String>,
}

/// A fully parsed project file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Selected compiler.
    pub builder: BuilderKind,
    /// Compile units.
    pub sources: Vec<SourceSpec>,
    /// Scoped, per-language flag vectors.
    pub flags: HashMap<FileType, HashMap<FlagScope, Vec<String>>>,
    /// Hash of the project file's bytes; gates build-cache retention.
    pub content_hash: ContentHash,
}

impl ProjectConfig {
    /// Creates an empty configuration with the given content hash.
    pub fn empty(content_hash: ContentHash) -> Self {
        Self {
            builder: BuilderKind::Fallback,
            sources: Vec::new(),
            flags: HashMap::new(),
            content_hash,
        }
    }

    /// The flag vector for one scope and language, or empty.
    pub fn scoped_flags(&self, scope: FlagScope, file_type: FileType) -> &[String] {
        self.flags
            .get(&file_type)
            .and_then(|by_scope| by_scope.get(&scope))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The effective flag list for compiling one file:
    /// `global[lang] + scope[lang] + per-file`, order-preserving and
    /// de-duplicated across the three layers.
    pub fn effective_flags(
        &self,
        file_type: FileType,
        scope: FlagScope,
        file_flags: &[String],
    ) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for flag in self
            .scoped_flags(FlagScope::Global, file_type)
            .iter()
            .chain(self.scoped_flags(scope, file_type))
            .chain(file_flags)
        {
            if seen.insert(flag.clone()) {
                out.push(flag.clone());
            }
        }
        out
    }
}
