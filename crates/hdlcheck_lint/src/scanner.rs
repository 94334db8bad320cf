//! Region-aware declaration scanning for the unused-object check.

use regex::Regex;
use std::sync::LazyLock;

static ENTITY_ZONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*entity\s+\w+\s+is\b").unwrap());
static ARCHITECTURE_ZONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*architecture\s+\w+\s+of\s+\w+").unwrap());
static PACKAGE_BODY_ZONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*package\s+body\s+\w+\s+is\b").unwrap());
static PACKAGE_ZONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*package\s+\w+\s+is\b").unwrap());

static PORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*([\w\s,]+?)\s*:\s*(?:in|out|inout|buffer|linkage)\s+\w+").unwrap()
});
static GENERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*([\w\s,]+?)\s*:\s*\w+").unwrap());
static SIGNAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*signal\s+([\w\s,]+?)\s*:").unwrap());
static CONSTANT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*constant\s+([\w\s,]+?)\s*:").unwrap());
static TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*type\s+(\w+)\s+is\b").unwrap());
static SHARED_VARIABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*shared\s+variable\s+([\w\s,]+?)\s*:").unwrap());
static ATTRIBUTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*attribute\s+(\w+)\s*:").unwrap());

static END_OF_SCAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bport\s+map|\bgenerate\b|\w+\s*:\s*entity\b|\bprocess\b").unwrap()
});

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").unwrap());

/// The declarative region the scanner is currently inside.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Zone {
    Outside,
    Entity,
    Architecture,
    Package,
    PackageBody,
}

/// A declared object, with its declaration site.
#[derive(Clone, Debug, PartialEq)]
pub struct DeclaredObject {
    /// Object name as declared.
    pub name: String,
    /// Declaration kind (`signal`, `port`, ...).
    pub kind: &'static str,
    /// 1-based declaration line.
    pub line: u32,
    /// 1-based declaration column.
    pub column: u32,
}

/// Walks the text zone by zone collecting declarations, stopping at the
/// first statement-region keyword.
pub fn declared_objects(text: &str) -> Vec<DeclaredObject> {
    let mut objects: Vec<DeclaredObject> = Vec::new();
    let mut zone = Zone::Outside;

    for (index, raw_line) in text.lines().enumerate() {
        let line = strip_comment(raw_line);
        let lnum = index as u32 + 1;

        if PACKAGE_BODY_ZONE_RE.is_match(line) {
            zone = Zone::PackageBody;
        } else if PACKAGE_ZONE_RE.is_match(line) {
            zone = Zone::Package;
        } else if ENTITY_ZONE_RE.is_match(line) {
            zone = Zone::Entity;
        } else if ARCHITECTURE_ZONE_RE.is_match(line) {
            zone = Zone::Architecture;
        }

        match zone {
            Zone::Outside => {
                capture(&mut objects, &ATTRIBUTE_RE, "attribute", line, lnum);
            }
            Zone::Entity => {
                if PORT_RE.is_match(line) {
                    capture(&mut objects, &PORT_RE, "port", line, lnum);
                } else {
                    capture(&mut objects, &GENERIC_RE, "generic", line, lnum);
                }
            }
            Zone::Architecture | Zone::Package | Zone::PackageBody => {
                capture(&mut objects, &SIGNAL_RE, "signal", line, lnum);
                capture(&mut objects, &CONSTANT_RE, "constant", line, lnum);
                capture(&mut objects, &TYPE_RE, "type", line, lnum);
                capture(
                    &mut objects,
                    &SHARED_VARIABLE_RE,
                    "shared variable",
                    line,
                    lnum,
                );
                capture(&mut objects, &ATTRIBUTE_RE, "attribute", line, lnum);
            }
        }

        if END_OF_SCAN_RE.is_match(line) {
            break;
        }
    }

    objects
}

fn capture(
    objects: &mut Vec<DeclaredObject>,
    pattern: &Regex,
    kind: &'static str,
    line: &str,
    lnum: u32,
) {
    let caps = match pattern.captures(line) {
        Some(caps) => caps,
        None => return,
    };
    let group = caps.get(1).unwrap();
    // A declaration can name several objects ("signal a, b : ...").
    for word in WORD_RE.find_iter(group.as_str()) {
        let name = word.as_str().to_string();
        if objects.iter().any(|o| o.name.eq_ignore_ascii_case(&name)) {
            continue;
        }
        objects.push(DeclaredObject {
            name,
            kind,
            line: lnum,
            column: group.start() as u32 + word.start() as u32 + 1,
        });
    }
}

/// Counts whole-word, case-insensitive occurrences of `name` in `text`.
pub fn occurrence_count(text: &str, name: &str) -> usize {
    let pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(name)));
    match pattern {
        Ok(re) => re.find_iter(text).count(),
        Err(_) => usize::MAX,
    }
}

/// Removes a trailing `--` comment from a line.
pub fn strip_comment(line: &str) -> &str {
    match line.find("--") {
        Some(pos) => &line[..pos],
        None => line,
    }
}
