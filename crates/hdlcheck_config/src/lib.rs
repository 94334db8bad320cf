//! Project configuration loading.
//!
//! The project file is a plain-text, line-oriented format: parameter lines
//! (`builder = msim`, `global_build_flags[vhdl] = -2008`) and source lines
//! (`vhdl my_lib src/*.vhd -check_synthesis`). The loader re-parses only
//! when the file's mtime advances.

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::{parse_config, ConfigLoader};
pub use types::{BuilderKind, FlagScope, ProjectConfig, SourceSpec};
