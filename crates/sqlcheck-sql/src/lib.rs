//! `sqlcheck-sql` - SQL analysis engine for `sqlcheck-core`.
//!
//! [`SqlEngine`] implements [`sqlcheck_core::AnalysisEngine`]:
//! - formatting: `sqlparser` validation (`GenericDialect`) followed by `sqlformat`
//! - colorization: a line-oriented regex highlighter over the visible lines only
//! - conformance: a small rule set (`select-star`, `keyword-case`, `trailing-whitespace`,
//!   `line-length`) over the source with literals and comments masked out
//!
//! # Example
//!
//! ```
//! use sqlcheck_core::{AnalysisConfig, AnalysisLoop, HeadlessSurface};
//! use sqlcheck_sql::SqlEngine;
//!
//! let analysis = AnalysisLoop::new(
//!     HeadlessSurface::new("SELECT * FROM t", 25),
//!     SqlEngine::new().unwrap(),
//!     AnalysisConfig::default(),
//! );
//! analysis.on_check();
//!
//! let entries = analysis.notification().entries().to_vec();
//! assert_eq!(entries.len(), 1);
//! assert_eq!(entries[0].message, "avoid * in SELECT");
//! assert_eq!((entries[0].range.start, entries[0].range.len()), (7, 1));
//! ```

mod engine;
pub mod format;
pub mod highlight;
pub mod keywords;
pub mod rules;

pub use engine::SqlEngine;
pub use format::{FormatError, FormattedSql, SqlFormatter};
pub use highlight::{
    HighlightRule, SQL_STYLE_COMMENT, SQL_STYLE_KEYWORD, SQL_STYLE_NUMBER,
    SQL_STYLE_QUOTED_IDENTIFIER, SQL_STYLE_STRING, SqlHighlighter,
};
pub use rules::RuleSet;
