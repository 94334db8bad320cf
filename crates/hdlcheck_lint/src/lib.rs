//! Purely textual style checks for VHDL sources.
//!
//! No compiler is involved: the linter works on the raw text, so it keeps
//! functioning when only the fallback adapter is available. Two checks are
//! implemented: objects that are declared but never referenced, and
//! TODO/FIXME/XXX comment tags.

mod scanner;
mod tags;

use hdlcheck_diagnostics::{Diagnostic, Severity, STATIC_CHECKER_NAME};

/// Runs all static checks over one source text.
pub fn static_messages(text: &str) -> Vec<Diagnostic> {
    let mut diagnostics = unused_object_messages(text);
    diagnostics.extend(tags::comment_tag_messages(text));
    log::debug!("static check produced {} diagnostics", diagnostics.len());
    diagnostics
}

/// Reports declared-but-never-referenced objects.
///
/// An object counts as used when its name appears anywhere in the
/// comment-stripped text besides the declaration itself. The scan is
/// region-aware and stops at the first statement-ish construct, so only
/// declarative regions are searched for declarations.
pub fn unused_object_messages(text: &str) -> Vec<Diagnostic> {
    let objects = scanner::declared_objects(text);
    if objects.is_empty() {
        return Vec::new();
    }

    let stripped: String = text
        .lines()
        .map(scanner::strip_comment)
        .collect::<Vec<_>>()
        .join(" ");

    objects
        .into_iter()
        .filter(|object| scanner::occurrence_count(&stripped, &object.name) <= 1)
        .map(|object| {
            Diagnostic::new(
                Severity::StyleWarning,
                format!("{} '{}' is never used", object.kind, object.name),
            )
            .with_checker(STATIC_CHECKER_NAME)
            .with_line(object.line)
            .with_column(object.column)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unused_signal_is_reported() {
        let text = "\
entity foo is
end foo;
architecture rtl of foo is
  signal neat_signal : std_logic;
begin
end rtl;
";
        let diags = static_messages(text);
        assert_eq!(diags.len(), 1);
        let diag = &diags[0];
        assert_eq!(diag.severity, Severity::StyleWarning);
        assert_eq!(diag.checker, STATIC_CHECKER_NAME);
        assert_eq!(diag.text, "signal 'neat_signal' is never used");
        assert_eq!(diag.line, Some(4));
    }

    #[test]
    fn used_signal_is_not_reported() {
        let text = "\
architecture rtl of foo is
  signal counter : unsigned(7 downto 0);
begin
  counter <= counter + 1;
end rtl;
";
        assert!(static_messages(text).is_empty());
    }

    #[test]
    fn usage_is_case_insensitive() {
        let text = "\
architecture rtl of foo is
  signal My_Sig : std_logic;
begin
  y <= MY_SIG;
end rtl;
";
        assert!(static_messages(text).is_empty());
    }

    #[test]
    fn multiple_declarations_on_one_line() {
        let text = "\
architecture rtl of foo is
  signal a, b : std_logic;
begin
  y <= a;
end rtl;
";
        let diags = static_messages(text);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].text.contains("'b'"));
    }

    #[test]
    fn unused_port_and_generic() {
        let text = "\
entity foo is
  generic (
    width : integer := 8
  );
  port (
    unused_in : in std_logic
  );
end foo;
";
        let mut texts: Vec<String> = static_messages(text)
            .into_iter()
            .map(|d| d.text)
            .collect();
        texts.sort();
        assert_eq!(
            texts,
            [
                "generic 'width' is never used",
                "port 'unused_in' is never used"
            ]
        );
    }

    #[test]
    fn scan_stops_at_process() {
        // Declarations after the first process keyword are statements'
        // business, not the linter's.
        let text = "\
architecture rtl of foo is
  signal lonely : std_logic;
begin
  process (clk)
    constant ghost : integer := 0;
  begin
  end process;
end rtl;
";
        let diags = static_messages(text);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].text.contains("'lonely'"));
    }

    #[test]
    fn commented_out_usage_does_not_count() {
        let text = "\
architecture rtl of foo is
  signal dead : std_logic;
begin
  -- y <= dead;
end rtl;
";
        let diags = static_messages(text);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].text.contains("'dead'"));
    }

    #[test]
    fn comment_tags_are_style_info() {
        let text = "-- TODO: hook up the reset\nentity foo is\nend;\n";
        let diags = static_messages(text);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::StyleInfo);
        assert_eq!(diags[0].text, "TODO: hook up the reset");
        assert_eq!(diags[0].line, Some(1));
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(static_messages("").is_empty());
    }
}
