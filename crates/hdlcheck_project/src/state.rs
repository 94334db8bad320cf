//! Persistence of the analysis state across daemon restarts.
//!
//! Everything lives in one JSON document, `.hdlcheck.cache`, inside the
//! project work directory: the database tables, the active builder's
//! per-path compile cache, and the config hash that gated them. A schema
//! version is stamped explicitly; any mismatch makes the file invisible.

use hdlcheck_builders::BuilderState;
use hdlcheck_common::ContentHash;
use hdlcheck_config::BuilderKind;
use hdlcheck_database::Database;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Version of the on-disk layout. Bump on any incompatible change.
pub const SCHEMA_VERSION: u32 = 1;

/// File name of the persisted state inside the work directory.
pub const CACHE_FILE_NAME: &str = ".hdlcheck.cache";

/// The persisted state could not be used.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Reading or writing the cache file failed.
    #[error("cache i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// The file exists but is not decodable.
    #[error("cache not decodable: {0}")]
    Decode(String),

    /// The file was written by a different schema version.
    #[error("cache schema version {found} does not match {SCHEMA_VERSION}")]
    SchemaMismatch {
        /// Version found in the file.
        found: u32,
    },
}

/// Everything `.hdlcheck.cache` holds.
#[derive(Serialize, Deserialize, Debug)]
pub struct PersistedState {
    /// On-disk layout version.
    pub schema_version: u32,
    /// The builder the cache was produced with.
    pub builder_name: BuilderKind,
    /// The builder's per-path compile cache.
    pub builder_state: BuilderState,
    /// Hash of the config the database was accepted from.
    pub config_hash: Option<ContentHash>,
    /// Database tables.
    pub database: Database,
}

impl PersistedState {
    /// Packs the current state for saving.
    pub fn new(
        builder_name: BuilderKind,
        builder_state: BuilderState,
        config_hash: Option<ContentHash>,
        database: Database,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            builder_name,
            builder_state,
            config_hash,
            database,
        }
    }

    /// Loads a state file. Fails on missing file, undecodable content, or
    /// schema mismatch; the caller logs and starts fresh in all cases.
    pub fn load(path: &Path) -> Result<Self, CacheError> {
        let text = std::fs::read_to_string(path)?;
        let mut state: PersistedState =
            serde_json::from_str(&text).map_err(|err| CacheError::Decode(err.to_string()))?;
        if state.schema_version != SCHEMA_VERSION {
            return Err(CacheError::SchemaMismatch {
                found: state.schema_version,
            });
        }
        state.database.rebuild_index();
        debug!("recovered state from '{}'", path.display());
        Ok(state)
    }

    /// Writes the state file, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json =
            serde_json::to_string(self).map_err(|err| CacheError::Decode(err.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PersistedState {
        PersistedState::new(
            BuilderKind::Ghdl,
            BuilderState::default(),
            Some(ContentHash::from_bytes(b"config")),
            Database::new(),
        )
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(CACHE_FILE_NAME);
        sample().save(&file).unwrap();

        let loaded = PersistedState::load(&file).unwrap();
        assert_eq!(loaded.schema_version, SCHEMA_VERSION);
        assert_eq!(loaded.builder_name, BuilderKind::Ghdl);
        assert_eq!(
            loaded.config_hash,
            Some(ContentHash::from_bytes(b"config"))
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            PersistedState::load(&dir.path().join(CACHE_FILE_NAME)),
            Err(CacheError::Io(_))
        ));
    }

    #[test]
    fn corrupt_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(CACHE_FILE_NAME);
        std::fs::write(&file, "definitely {{ not json").unwrap();
        assert!(matches!(
            PersistedState::load(&file),
            Err(CacheError::Decode(_))
        ));
    }

    #[test]
    fn schema_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(CACHE_FILE_NAME);
        let mut state = sample();
        state.schema_version = SCHEMA_VERSION + 1;
        let json = serde_json::to_string(&state).unwrap();
        std::fs::write(&file, json).unwrap();

        assert!(matches!(
            PersistedState::load(&file),
            Err(CacheError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("deep").join("work").join(CACHE_FILE_NAME);
        sample().save(&file).unwrap();
        assert!(file.exists());
    }
}
