//! File-type classification from source extensions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// The HDL dialect of a source file, derived from its extension.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// `.vhd` / `.vhdl`
    Vhdl,
    /// `.v` / `.vh`
    Verilog,
    /// `.sv` / `.svh`
    SystemVerilog,
}

/// The extension did not match any known HDL dialect.
#[derive(Debug, thiserror::Error)]
#[error("unknown file type for path '{}'", .0.display())]
pub struct UnknownTypeExtension(pub PathBuf);

impl FileType {
    /// Classifies a path by its extension (matched case-insensitively).
    pub fn from_path(path: &Path) -> Result<Self, UnknownTypeExtension> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "vhd" | "vhdl" => Ok(FileType::Vhdl),
            "v" | "vh" => Ok(FileType::Verilog),
            "sv" | "svh" => Ok(FileType::SystemVerilog),
            _ => Err(UnknownTypeExtension(path.to_path_buf())),
        }
    }

    /// Parses a config-file language name.
    pub fn from_lang(lang: &str) -> Option<Self> {
        match lang.to_lowercase().as_str() {
            "vhdl" => Some(FileType::Vhdl),
            "verilog" => Some(FileType::Verilog),
            "systemverilog" => Some(FileType::SystemVerilog),
            _ => None,
        }
    }

    /// Header files (`.vh`, `.svh`) are not compile units.
    pub fn is_header(path: &Path) -> bool {
        matches!(
            path.extension()
                .and_then(|e| e.to_str())
                .map(str::to_lowercase)
                .as_deref(),
            Some("vh") | Some("svh")
        )
    }

    /// Whether identifiers of this dialect compare case-sensitively.
    pub fn case_sensitive(self) -> bool {
        !matches!(self, FileType::Vhdl)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileType::Vhdl => write!(f, "vhdl"),
            FileType::Verilog => write!(f, "verilog"),
            FileType::SystemVerilog => write!(f, "systemverilog"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_table() {
        assert_eq!(
            FileType::from_path(Path::new("a.vhd")).unwrap(),
            FileType::Vhdl
        );
        assert_eq!(
            FileType::from_path(Path::new("a.VHDL")).unwrap(),
            FileType::Vhdl
        );
        assert_eq!(
            FileType::from_path(Path::new("a.v")).unwrap(),
            FileType::Verilog
        );
        assert_eq!(
            FileType::from_path(Path::new("a.vh")).unwrap(),
            FileType::Verilog
        );
        assert_eq!(
            FileType::from_path(Path::new("a.sv")).unwrap(),
            FileType::SystemVerilog
        );
        assert_eq!(
            FileType::from_path(Path::new("a.svh")).unwrap(),
            FileType::SystemVerilog
        );
    }

    #[test]
    fn unknown_extension_errors() {
        assert!(FileType::from_path(Path::new("a.txt")).is_err());
        assert!(FileType::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn headers() {
        assert!(FileType::is_header(Path::new("defs.vh")));
        assert!(FileType::is_header(Path::new("pkg.svh")));
        assert!(!FileType::is_header(Path::new("top.v")));
        assert!(!FileType::is_header(Path::new("top.vhd")));
    }

    #[test]
    fn case_sensitivity_per_dialect() {
        assert!(!FileType::Vhdl.case_sensitive());
        assert!(FileType::Verilog.case_sensitive());
        assert!(FileType::SystemVerilog.case_sensitive());
    }

    #[test]
    fn lang_names() {
        assert_eq!(FileType::from_lang("VHDL"), Some(FileType::Vhdl));
        assert_eq!(
            FileType::from_lang("systemverilog"),
            Some(FileType::SystemVerilog)
        );
        assert_eq!(FileType::from_lang("ada"), None);
    }
}
