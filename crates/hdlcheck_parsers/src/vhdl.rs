//! Single-pass lexical scanner for VHDL sources.

use crate::{DependencySpec, DesignUnit, DesignUnitKind, ParseResult};
use hdlcheck_common::{CanonPath, Identifier, Location};
use log::debug;
use regex::Regex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::io;
use std::sync::LazyLock;

static PACKAGE_BODY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*package\s+body\s+(\w+)\s+is\b").unwrap());
static PACKAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*package\s+(\w+)\s+is\b").unwrap());
static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*entity\s+(\w+)\s+is\b").unwrap());
static CONTEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*context\s+(\w+)\s+is\b").unwrap());
static ARCHITECTURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*architecture\s+\w+\s+of\s+(\w+)\b").unwrap());
static LIBRARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*library\s+([\w\s,]+)").unwrap());

/// Parses a VHDL file from disk. `library` is the project library the file
/// belongs to; `work` references are rewritten to it.
pub fn parse_vhdl(
    path: &CanonPath,
    library: &Identifier,
) -> io::Result<ParseResult> {
    let bytes = std::fs::read(path.as_path())?;
    Ok(scan_vhdl(path, &String::from_utf8_lossy(&bytes), library))
}

/// Scans VHDL text that has already been read from `path`.
pub(crate) fn scan_vhdl(path: &CanonPath, text: &str, library: &Identifier) -> ParseResult {
    let lines: Vec<String> = text
        .lines()
        .map(|line| strip_line_comment(line).to_lowercase())
        .collect();

    let mut units: HashMap<(DesignUnitKind, Identifier), BTreeSet<Location>> = HashMap::new();
    // Implicit dependencies carried by package bodies and architectures:
    // both require their primary unit to exist in the owning library.
    let mut implicit: HashMap<Identifier, BTreeSet<Location>> = HashMap::new();
    let mut libraries: HashSet<String> = HashSet::from(["work".to_string()]);

    for (index, line) in lines.iter().enumerate() {
        let lnum = index as u32 + 1;
        if let Some(cap) = PACKAGE_BODY_RE.captures(line) {
            let m = cap.get(1).unwrap();
            implicit
                .entry(Identifier::vhdl(m.as_str()))
                .or_default()
                .insert(Location::new(lnum, m.start() as u32 + 1));
            continue;
        }
        if let Some(cap) = PACKAGE_RE.captures(line) {
            let m = cap.get(1).unwrap();
            units
                .entry((DesignUnitKind::Package, Identifier::vhdl(m.as_str())))
                .or_default()
                .insert(Location::new(lnum, m.start() as u32 + 1));
        } else if let Some(cap) = ENTITY_RE.captures(line) {
            let m = cap.get(1).unwrap();
            units
                .entry((DesignUnitKind::Entity, Identifier::vhdl(m.as_str())))
                .or_default()
                .insert(Location::new(lnum, m.start() as u32 + 1));
        } else if let Some(cap) = CONTEXT_RE.captures(line) {
            let m = cap.get(1).unwrap();
            units
                .entry((DesignUnitKind::Context, Identifier::vhdl(m.as_str())))
                .or_default()
                .insert(Location::new(lnum, m.start() as u32 + 1));
        } else if let Some(cap) = ARCHITECTURE_RE.captures(line) {
            let m = cap.get(1).unwrap();
            implicit
                .entry(Identifier::vhdl(m.as_str()))
                .or_default()
                .insert(Location::new(lnum, m.start() as u32 + 1));
        }
        if let Some(cap) = LIBRARY_RE.captures(line) {
            for name in cap[1].split(',') {
                let name = name.trim();
                if !name.is_empty() {
                    libraries.insert(name.to_string());
                }
            }
        }
    }

    // Dotted references are only meaningful for libraries in scope.
    let alternation = libraries
        .iter()
        .map(|l| regex::escape(l))
        .collect::<Vec<_>>()
        .join("|");
    let dep_re = Regex::new(&format!(r"\b({alternation})\.(\w+)")).unwrap();

    let mut deps: HashMap<(Identifier, Identifier), BTreeSet<Location>> = HashMap::new();
    for (index, line) in lines.iter().enumerate() {
        for cap in dep_re.captures_iter(line) {
            let m = cap.get(0).unwrap();
            let lib = if &cap[1] == "work" {
                // 'work' is a pseudonym for the owning library.
                library.clone()
            } else {
                Identifier::vhdl(&cap[1])
            };
            deps.entry((lib, Identifier::vhdl(&cap[2])))
                .or_default()
                .insert(Location::new(index as u32 + 1, m.start() as u32 + 1));
        }
    }

    for (name, locations) in implicit {
        deps.entry((library.clone(), name))
            .or_default()
            .extend(locations);
    }

    let own_names: HashSet<&Identifier> = units.keys().map(|(_, name)| name).collect();
    let design_units: Vec<DesignUnit> = units
        .iter()
        .map(|((kind, name), locations)| DesignUnit {
            owner: path.clone(),
            kind: *kind,
            name: name.clone(),
            locations: locations.clone(),
        })
        .collect();

    let dependencies: Vec<DependencySpec> = deps
        .into_iter()
        .filter(|((lib, name), _)| !(lib == library && own_names.contains(name)))
        .map(|((lib, name), locations)| DependencySpec {
            owner: path.clone(),
            library: Some(lib),
            name,
            locations,
        })
        .collect();

    debug!(
        "{}: {} design units, {} dependencies",
        path,
        design_units.len(),
        dependencies.len()
    );

    ParseResult {
        design_units,
        dependencies,
    }
}

/// Removes a trailing `--` comment from a single line.
fn strip_line_comment(line: &str) -> &str {
    match line.find("--") {
        Some(pos) => &line[..pos],
        None => line,
    }
}
