//! Adapter error types.

/// The compiler's environment probe failed.
///
/// Recovery is always the same: the project demotes the adapter to
/// [`Fallback`](crate::Fallback) and surfaces this as a UI error.
#[derive(Debug, thiserror::Error)]
#[error("sanity check for builder '{builder}' failed: {message}")]
pub struct SanityCheckError {
    /// Name of the builder whose probe failed.
    pub builder: String,
    /// Human-readable probe failure.
    pub message: String,
}

impl SanityCheckError {
    /// Creates a sanity-check error for the named builder.
    pub fn new(builder: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            builder: builder.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_builder() {
        let err = SanityCheckError::new("msim", "vcom not found");
        let text = format!("{err}");
        assert!(text.contains("msim"));
        assert!(text.contains("vcom not found"));
    }
}
