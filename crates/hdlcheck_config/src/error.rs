//! Error types for configuration loading.

use std::path::PathBuf;

/// Errors raised while loading a project file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the project file.
    #[error("failed to read project file '{}': {source}", .path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A parameter line used a name the loader does not recognize.
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    /// The `builder` parameter named an unknown compiler.
    #[error("unknown builder '{0}' (expected msim, xvhdl or ghdl)")]
    UnknownBuilder(String),

    /// A flag parameter was given without a `[language]` qualifier.
    #[error("parameter '{0}' requires a language qualifier, e.g. '{0}[vhdl]'")]
    MissingLanguage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_unknown_parameter() {
        let err = ConfigError::UnknownParameter("tarrget_dir".to_string());
        assert_eq!(format!("{err}"), "unknown parameter 'tarrget_dir'");
    }

    #[test]
    fn display_unknown_builder() {
        let err = ConfigError::UnknownBuilder("icarus".to_string());
        assert!(format!("{err}").contains("icarus"));
    }

    #[test]
    fn display_missing_language() {
        let err = ConfigError::MissingLanguage("global_build_flags".to_string());
        assert!(format!("{err}").contains("global_build_flags[vhdl]"));
    }
}
