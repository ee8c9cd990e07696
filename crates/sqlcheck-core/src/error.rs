//! Error types surfaced by analysis runs and configuration loading.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Failure reported by an analysis engine.
///
/// Analysis failures never abort the host; the loop turns them into a visible
/// [`NotificationState::Error`](crate::NotificationState::Error).
pub enum AnalysisError {
    #[error("{0}")]
    /// The engine rejected the buffer (malformed SQL, internal engine failure).
    Analysis(String),

    #[error("configuration error: {0}")]
    /// A configuration problem propagated from a collaborator. Not retried.
    Configuration(String),
}

impl AnalysisError {
    /// Shorthand for [`AnalysisError::Analysis`].
    pub fn analysis(message: impl Into<String>) -> Self {
        Self::Analysis(message.into())
    }

    /// Shorthand for [`AnalysisError::Configuration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

#[derive(Debug, Error)]
/// Errors produced while loading an [`AnalysisConfig`](crate::AnalysisConfig).
pub enum ConfigError {
    #[error("failed to read configuration {path}: {source}")]
    /// The configuration file could not be read.
    Io {
        /// The path that was read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration JSON: {0}")]
    /// The configuration text is not valid JSON for the configuration schema.
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_error_displays_bare_message() {
        assert_eq!(AnalysisError::analysis("syntax error").to_string(), "syntax error");
    }

    #[test]
    fn test_configuration_error_is_prefixed() {
        assert_eq!(
            AnalysisError::configuration("max_line_length must be at least 1").to_string(),
            "configuration error: max_line_length must be at least 1"
        );
    }
}
