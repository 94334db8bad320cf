//! Case-aware identifiers for HDL names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A source-level name together with its case-sensitivity rule.
///
/// VHDL identifiers compare case-insensitively while (System)Verilog
/// identifiers compare case-sensitively. The raw spelling is preserved for
/// display; comparisons and hashing fold to lowercase when the identifier
/// is case-insensitive.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Identifier {
    name: String,
    case_sensitive: bool,
}

impl Identifier {
    /// Creates an identifier with an explicit case-sensitivity rule.
    pub fn new(name: impl Into<String>, case_sensitive: bool) -> Self {
        Self {
            name: name.into(),
            case_sensitive,
        }
    }

    /// Creates a case-insensitive (VHDL) identifier.
    pub fn vhdl(name: impl Into<String>) -> Self {
        Self::new(name, false)
    }

    /// Creates a case-sensitive ((System)Verilog) identifier.
    pub fn verilog(name: impl Into<String>) -> Self {
        Self::new(name, true)
    }

    /// The raw spelling as it appeared in the source.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether comparisons use the raw spelling.
    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// The form used for comparisons: raw when case-sensitive, lowercased
    /// otherwise.
    pub fn effective_name(&self) -> String {
        if self.case_sensitive {
            self.name.clone()
        } else {
            self.name.to_lowercase()
        }
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.effective_name() == other.effective_name()
    }
}

impl Eq for Identifier {}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.effective_name().hash(state);
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.effective_name().cmp(&other.effective_name())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
