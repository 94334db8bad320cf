//! References from one source to design units declared elsewhere.

use hdlcheck_common::{CanonPath, Identifier, Location};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A `library.unit` reference found in a source file.
///
/// `library == None` means "the library of the owning source". The `work`
/// pseudo-library is already rewritten to the owning library by the
/// parsers, so consumers never see it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DependencySpec {
    /// File containing the reference.
    pub owner: CanonPath,
    /// Target library, or `None` for the owner's library.
    pub library: Option<Identifier>,
    /// Target unit name.
    pub name: Identifier,
    /// Reference sites.
    pub locations: BTreeSet<Location>,
}

impl DependencySpec {
    /// Creates a dependency with a single reference site.
    pub fn new(
        owner: CanonPath,
        library: Option<Identifier>,
        name: Identifier,
        location: Location,
    ) -> Self {
        Self {
            owner,
            library,
            name,
            locations: BTreeSet::from([location]),
        }
    }

    /// The library to resolve against, given the owning source's library.
    pub fn library_or<'a>(&'a self, owner_library: &'a Identifier) -> &'a Identifier {
        self.library.as_ref().unwrap_or(owner_library)
    }
}

impl PartialEq for DependencySpec {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.library == other.library && self.name == other.name
    }
}

impl Eq for DependencySpec {}

impl Hash for DependencySpec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.owner.hash(state);
        self.library.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Display for DependencySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.library {
            Some(lib) => write!(f, "{}.{}", lib, self.name),
            None => write!(f, "<owner>.{}", self.name),
        }
    }
}
