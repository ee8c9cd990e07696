use crate::format::{FormattedSql, SqlFormatter};
use crate::highlight::SqlHighlighter;
use crate::rules::RuleSet;
use sqlcheck_core::{
    AnalysisConfig, AnalysisEngine, AnalysisError, ConformanceConfig, Diagnostic, EditorSurface,
    FormattedBuffer,
};
use tracing::{debug, trace};

/// The SQL [`AnalysisEngine`]: `sqlparser` validation, `sqlformat` formatting, a regex colorizer
/// and the conformance [`RuleSet`].
#[derive(Debug, Clone)]
pub struct SqlEngine {
    highlighter: SqlHighlighter,
    rules: RuleSet,
}

impl SqlEngine {
    /// Build the engine with the default grammar and rules.
    pub fn new() -> Result<Self, AnalysisError> {
        let highlighter = SqlHighlighter::sql_default().map_err(internal)?;
        let rules = RuleSet::new().map_err(internal)?;
        Ok(Self { highlighter, rules })
    }

    fn colorize_visible(&self, text: &str, surface: &mut dyn EditorSurface) {
        let first_line = surface.first_visible_line();
        let line_count = surface.visible_line_count();
        let spans = self.highlighter.highlight_lines(text, first_line, line_count);
        trace!(first_line, line_count, spans = spans.len(), "colorized");
        surface.replace_styles(spans);
    }
}

impl AnalysisEngine for SqlEngine {
    type Formatted = FormattedSql;

    fn colorize(
        &mut self,
        text: &str,
        surface: &mut dyn EditorSurface,
        _config: &AnalysisConfig,
    ) -> Result<(), AnalysisError> {
        self.colorize_visible(text, surface);
        Ok(())
    }

    fn format(
        &mut self,
        text: &str,
        _surface: &mut dyn EditorSurface,
        config: &AnalysisConfig,
    ) -> Result<FormattedSql, AnalysisError> {
        let formatted = SqlFormatter::new(config.format.clone()).format(text)?;
        debug!(is_formatted = formatted.is_formatted(), "formatted");
        Ok(formatted)
    }

    fn colorize_formatted(
        &mut self,
        formatted: &FormattedSql,
        surface: &mut dyn EditorSurface,
        _config: &AnalysisConfig,
    ) -> Result<(), AnalysisError> {
        self.colorize_visible(formatted.source(), surface);
        Ok(())
    }

    fn check_conformance(
        &mut self,
        formatted: &FormattedSql,
        conformance: &ConformanceConfig,
    ) -> Result<Vec<Diagnostic>, AnalysisError> {
        let diagnostics = self.rules.check(
            formatted.source(),
            formatted.uppercase_keywords(),
            conformance,
        );
        debug!(count = diagnostics.len(), "conformance rules finished");
        Ok(diagnostics)
    }
}

fn internal(err: regex::Error) -> AnalysisError {
    AnalysisError::analysis(format!("internal grammar error: {err}"))
}
