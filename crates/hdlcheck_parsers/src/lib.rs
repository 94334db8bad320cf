//! Lexical extraction of design units and dependencies from HDL sources.
//!
//! These are not full HDL parsers. A single pass over the comment-stripped
//! text recognizes just enough structure to know which design units a file
//! declares and which `library.unit` names it references.

pub mod design_unit;
pub mod dependency;
mod vhdl;
mod verilog;

pub use design_unit::{DesignUnit, DesignUnitKind};
pub use dependency::DependencySpec;
pub use vhdl::parse_vhdl;
pub use verilog::parse_verilog;

use hdlcheck_common::{CanonPath, FileType, Identifier};
use std::io;

/// Everything a single source file contributes to the project model.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParseResult {
    /// Design units declared in the file.
    pub design_units: Vec<DesignUnit>,
    /// References to units declared elsewhere.
    pub dependencies: Vec<DependencySpec>,
}

/// Parses a source file according to its type.
///
/// `library` is the library the file is assigned to in the project; `work`
/// references are rewritten to it. Safe to call concurrently on distinct
/// files.
pub fn parse_source(
    path: &CanonPath,
    file_type: FileType,
    library: &Identifier,
) -> io::Result<ParseResult> {
    let bytes = std::fs::read(path.as_path())?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(match file_type {
        FileType::Vhdl => vhdl::scan_vhdl(path, &text, library),
        FileType::Verilog | FileType::SystemVerilog => verilog::scan_verilog(path, &text),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_source_dispatches_on_file_type() {
        let dir = tempfile::tempdir().unwrap();
        let vhdl_file = dir.path().join("a.vhd");
        std::fs::write(&vhdl_file, "entity a is\nend;\n").unwrap();
        let sv_file = dir.path().join("m.sv");
        std::fs::write(&sv_file, "module m;\nendmodule\n").unwrap();

        let library = Identifier::vhdl("lib");
        let vhdl_result =
            parse_source(&CanonPath::new(&vhdl_file), FileType::Vhdl, &library).unwrap();
        assert_eq!(vhdl_result.design_units.len(), 1);
        assert!(!vhdl_result.design_units[0].name.is_case_sensitive());

        let sv_result =
            parse_source(&CanonPath::new(&sv_file), FileType::SystemVerilog, &library).unwrap();
        assert_eq!(sv_result.design_units.len(), 1);
        assert!(sv_result.design_units[0].name.is_case_sensitive());
    }

    #[test]
    fn parse_source_missing_file_errors() {
        let library = Identifier::vhdl("lib");
        assert!(parse_source(
            &CanonPath::new("/nonexistent/a.vhd"),
            FileType::Vhdl,
            &library
        )
        .is_err());
    }

    #[test]
    fn invalid_utf8_is_replaced_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("latin.vhd");
        std::fs::write(&file, b"-- caf\xe9\nentity accent_free is\nend;\n").unwrap();

        let library = Identifier::vhdl("lib");
        let result = parse_source(&CanonPath::new(&file), FileType::Vhdl, &library).unwrap();
        assert_eq!(result.design_units.len(), 1);
    }
}
