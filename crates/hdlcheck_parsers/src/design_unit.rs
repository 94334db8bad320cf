//! Design units declared by a source file.

use hdlcheck_common::{CanonPath, Identifier, Location};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// The kind of a tracked design unit.
///
/// Verilog modules are tracked as entities. Package bodies are not design
/// units; they contribute a dependency on their package instead.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesignUnitKind {
    /// VHDL entity or Verilog module.
    Entity,
    /// VHDL or SystemVerilog package.
    Package,
    /// VHDL context declaration.
    Context,
}

impl fmt::Display for DesignUnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DesignUnitKind::Entity => write!(f, "entity"),
            DesignUnitKind::Package => write!(f, "package"),
            DesignUnitKind::Context => write!(f, "context"),
        }
    }
}

/// A declaration that other sources can reference.
///
/// Identity is `(owner, kind, name)`; the declaration locations are
/// carried along but do not participate in equality or hashing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DesignUnit {
    /// File declaring the unit.
    pub owner: CanonPath,
    /// Unit kind.
    pub kind: DesignUnitKind,
    /// Unit name; case rule follows the owning file's language.
    pub name: Identifier,
    /// Declaration sites.
    pub locations: BTreeSet<Location>,
}

impl DesignUnit {
    /// Creates a unit with a single declaration site.
    pub fn new(
        owner: CanonPath,
        kind: DesignUnitKind,
        name: Identifier,
        location: Location,
    ) -> Self {
        Self {
            owner,
            kind,
            name,
            locations: BTreeSet::from([location]),
        }
    }
}

impl PartialEq for DesignUnit {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.kind == other.kind && self.name == other.name
    }
}

impl Eq for DesignUnit {}

impl Hash for DesignUnit {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.owner.hash(state);
        self.kind.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Display for DesignUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' in {}", self.kind, self.name, self.owner)
    }
}
