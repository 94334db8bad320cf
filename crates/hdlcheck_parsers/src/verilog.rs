//! Lexical scanner for Verilog and SystemVerilog sources.
//!
//! Only module and package declarations are mined. Instantiation-based
//! dependencies are intentionally not extracted; Verilog compile order is
//! driven by the project configuration instead.

use crate::{DesignUnit, DesignUnitKind, ParseResult};
use hdlcheck_common::{CanonPath, Identifier, Location};
use log::debug;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::io;
use std::sync::LazyLock;

static MODULE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bmodule\s+([a-zA-Z_][a-zA-Z0-9_$]*)").unwrap());
static PACKAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bpackage\s+([a-zA-Z_][a-zA-Z0-9_$]*)").unwrap());

/// Parses a (System)Verilog file from disk.
pub fn parse_verilog(path: &CanonPath) -> io::Result<ParseResult> {
    let bytes = std::fs::read(path.as_path())?;
    Ok(scan_verilog(path, &String::from_utf8_lossy(&bytes)))
}

/// Scans (System)Verilog text that has already been read from `path`.
pub(crate) fn scan_verilog(path: &CanonPath, text: &str) -> ParseResult {
    let blanked = blank_comments(text);

    let mut units: HashMap<(DesignUnitKind, Identifier), BTreeSet<Location>> = HashMap::new();
    for (index, line) in blanked.lines().enumerate() {
        let lnum = index as u32 + 1;
        for cap in MODULE_RE.captures_iter(line) {
            let m = cap.get(1).unwrap();
            units
                .entry((DesignUnitKind::Entity, Identifier::verilog(m.as_str())))
                .or_default()
                .insert(Location::new(lnum, m.start() as u32 + 1));
        }
        for cap in PACKAGE_RE.captures_iter(line) {
            let m = cap.get(1).unwrap();
            units
                .entry((DesignUnitKind::Package, Identifier::verilog(m.as_str())))
                .or_default()
                .insert(Location::new(lnum, m.start() as u32 + 1));
        }
    }

    let design_units: Vec<DesignUnit> = units
        .into_iter()
        .map(|((kind, name), locations)| DesignUnit {
            owner: path.clone(),
            kind,
            name,
            locations,
        })
        .collect();

    debug!("{}: {} design units", path, design_units.len());

    ParseResult {
        design_units,
        dependencies: Vec::new(),
    }
}

/// Replaces `/* */` and `//` comments with spaces, keeping byte offsets and
/// line structure intact so match positions stay meaningful.
fn blank_comments(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'*' {
            out.extend_from_slice(b"  ");
            i += 2;
            while i < bytes.len() {
                if bytes[i] == b'*' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
                    out.extend_from_slice(b"  ");
                    i += 2;
                    break;
                }
                out.push(if bytes[i] == b'\n' { b'\n' } else { b' ' });
                i += 1;
            }
        } else if bytes[i] == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
            while i < bytes.len() && bytes[i] != b'\n' {
                out.push(b' ');
                i += 1;
            }
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}
