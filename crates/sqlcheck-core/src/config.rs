//! Analysis configuration.
//!
//! The harness reads one JSON document describing how the engine formats, which conformance
//! rules are active, and how the host decorates the editor. Every field is optional in the JSON;
//! missing fields fall back to [`Default`].
//!
//! ```
//! use sqlcheck_core::{AnalysisConfig, Requirement};
//!
//! let config = AnalysisConfig::from_json_str(
//!     r#"{ "format": { "indent_size": 4 }, "host": { "decorations": "forbidden" } }"#,
//! )
//! .unwrap();
//! assert_eq!(config.format.indent_size, 4);
//! assert!(config.format.uppercase_keywords);
//! assert_eq!(config.host.decorations, Requirement::Forbidden);
//! assert!(!config.host.decorations_enabled());
//! ```

use crate::error::{AnalysisError, ConfigError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration handed to every engine call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Formatting options.
    pub format: FormatConfig,
    /// Conformance rule switches.
    pub conformance: ConformanceConfig,
    /// Host (editor) presentation options.
    pub host: HostConfig,
    /// Whether a full check also colorizes the formatted buffer.
    pub colorize_on_check: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            format: FormatConfig::default(),
            conformance: ConformanceConfig::default(),
            host: HostConfig::default(),
            colorize_on_check: true,
        }
    }
}

impl AnalysisConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}

/// Formatting options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Number of spaces for each indentation level.
    pub indent_size: usize,
    /// Whether keywords are expected in upper case.
    pub uppercase_keywords: bool,
    /// Number of blank lines between statements.
    pub lines_between_queries: usize,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            indent_size: 2,
            uppercase_keywords: true,
            lines_between_queries: 1,
        }
    }
}

/// Which conformance rules run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConformanceConfig {
    /// Flag `*` in select lists.
    pub select_star: bool,
    /// Flag keywords not written in the configured case.
    pub keyword_case: bool,
    /// Flag trailing blanks.
    pub trailing_whitespace: bool,
    /// Flag lines longer than this many chars.
    pub max_line_length: Option<usize>,
}

impl Default for ConformanceConfig {
    fn default() -> Self {
        Self {
            select_star: true,
            keyword_case: true,
            trailing_whitespace: true,
            max_line_length: None,
        }
    }
}

impl ConformanceConfig {
    /// Rejects rule settings no buffer can satisfy.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.max_line_length == Some(0) {
            return Err(AnalysisError::configuration(
                "max_line_length must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Requirement level of an optional host feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Requirement {
    /// The feature must be present.
    Required,
    /// The feature may be present.
    #[default]
    Optional,
    /// The feature must not be present.
    Forbidden,
}

/// Host presentation options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HostConfig {
    /// Line numbers, whitespace markers and modification glyphs.
    pub decorations: Requirement,
}

impl HostConfig {
    /// Decorations are painted unless they are forbidden.
    pub fn decorations_enabled(&self) -> bool {
        self.decorations != Requirement::Forbidden
    }
}
