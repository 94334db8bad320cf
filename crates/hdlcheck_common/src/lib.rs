//! Shared primitives for the hdlcheck analysis pipeline.
//!
//! Provides the case-aware [`Identifier`] used for HDL names, the
//! [`CanonPath`] wrapper with same-file equality semantics, the
//! [`FileType`] extension table, and source [`Location`]s.

pub mod file_type;
pub mod hash;
pub mod ident;
pub mod location;
pub mod path;

pub use file_type::{FileType, UnknownTypeExtension};
pub use hash::ContentHash;
pub use ident::Identifier;
pub use location::Location;
pub use path::CanonPath;
