//! TODO/FIXME/XXX comment-tag detection.

use hdlcheck_diagnostics::{Diagnostic, Severity, STATIC_CHECKER_NAME};
use regex::Regex;
use std::sync::LazyLock;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)--\s*(TODO|FIXME|XXX)\s*:\s*(.*)").unwrap());

/// Reports comment tags as style notes.
pub fn comment_tag_messages(text: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for (index, line) in text.lines().enumerate() {
        // Cheap containment check before the regex touches the line.
        let lowered = line.to_lowercase();
        if !["todo", "fixme", "xxx"].iter().any(|t| lowered.contains(t)) {
            continue;
        }
        for caps in TAG_RE.captures_iter(line) {
            let tag = caps.get(1).unwrap();
            diagnostics.push(
                Diagnostic::new(
                    Severity::StyleInfo,
                    format!("{}: {}", tag.as_str().to_uppercase(), caps[2].trim()),
                )
                .with_checker(STATIC_CHECKER_NAME)
                .with_line(index as u32 + 1)
                .with_column(tag.start() as u32 + 1),
            );
        }
    }
    diagnostics
}
