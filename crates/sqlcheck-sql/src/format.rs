//! SQL formatting stage.
//!
//! The buffer is validated with `sqlparser` first, so malformed SQL is rejected before anything
//! downstream runs, and then pretty-printed with `sqlformat`.
//!
//! # Example
//!
//! ```
//! use sqlcheck_core::{FormatConfig, FormattedBuffer};
//! use sqlcheck_sql::format::SqlFormatter;
//!
//! let formatter = SqlFormatter::new(FormatConfig::default());
//! let formatted = formatter.format("select id from users where id = 1").unwrap();
//! assert!(formatted.formatted().contains("SELECT"));
//! assert!(!formatted.is_formatted());
//! ```

use sqlcheck_core::{AnalysisError, FormatConfig, FormattedBuffer};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use thiserror::Error;

/// Errors that can occur during SQL formatting
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// The SQL input is empty
    #[error("empty SQL input")]
    EmptyInput,

    /// The SQL syntax is invalid
    #[error("invalid SQL syntax: {0}")]
    InvalidSyntax(String),
}

impl From<FormatError> for AnalysisError {
    fn from(err: FormatError) -> Self {
        AnalysisError::analysis(err.to_string())
    }
}

/// Output of [`SqlFormatter::format`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedSql {
    source: String,
    formatted: String,
    uppercase_keywords: bool,
}

impl FormattedSql {
    /// Keyword case the text was formatted with.
    pub fn uppercase_keywords(&self) -> bool {
        self.uppercase_keywords
    }
}

impl FormattedBuffer for FormattedSql {
    fn source(&self) -> &str {
        &self.source
    }

    fn formatted(&self) -> &str {
        &self.formatted
    }
}

/// SQL formatter with configurable options.
#[derive(Debug, Clone, Default)]
pub struct SqlFormatter {
    config: FormatConfig,
}

impl SqlFormatter {
    pub fn new(config: FormatConfig) -> Self {
        Self { config }
    }

    /// Checks that the SQL parses.
    pub fn validate(&self, sql: &str) -> Result<(), FormatError> {
        let trimmed = sql.trim();
        if trimmed.is_empty() {
            return Err(FormatError::EmptyInput);
        }

        let dialect = GenericDialect {};
        match Parser::parse_sql(&dialect, trimmed) {
            Ok(_) => Ok(()),
            Err(e) => Err(FormatError::InvalidSyntax(e.to_string())),
        }
    }

    /// Validate and format `sql`.
    ///
    /// A trailing newline in the input is kept, so a formatted file round-trips unchanged.
    pub fn format(&self, sql: &str) -> Result<FormattedSql, FormatError> {
        self.validate(sql)?;

        let options = self.build_format_options();
        let mut formatted = sqlformat::format(sql.trim(), &Default::default(), &options);
        if sql.ends_with('\n') {
            formatted.push('\n');
        }

        Ok(FormattedSql {
            source: sql.to_string(),
            formatted,
            uppercase_keywords: self.config.uppercase_keywords,
        })
    }

    fn build_format_options(&self) -> sqlformat::FormatOptions<'static> {
        sqlformat::FormatOptions {
            indent: sqlformat::Indent::Spaces(self.config.indent_size.min(u8::MAX as usize) as u8),
            uppercase: Some(self.config.uppercase_keywords),
            lines_between_queries: self.config.lines_between_queries.min(u8::MAX as usize) as u8,
            ..Default::default()
        }
    }
}
