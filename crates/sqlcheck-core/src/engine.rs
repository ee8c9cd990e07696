//! Analysis engine seam and invoker.
//!
//! External engines (formatters, colorizers, conformance checkers) implement [`AnalysisEngine`].
//! The free functions in this module are the invoker the synchronization loop calls: each one
//! reads the buffer from the [`EditorSurface`], runs the engine stages left to right and
//! short-circuits on the first failure.
//!
//! Engines may mutate the surface (style spans, or even the text) while they run. That is the
//! re-entrancy hazard [`AnalysisLoop`](crate::AnalysisLoop) guards against.

use crate::config::{AnalysisConfig, ConformanceConfig};
use crate::diagnostics::Diagnostic;
use crate::error::AnalysisError;
use crate::surface::EditorSurface;

/// Result of the formatting stage.
pub trait FormattedBuffer {
    /// The text that was formatted.
    fn source(&self) -> &str;

    /// The engine's formatted rendition of [`source`](Self::source).
    fn formatted(&self) -> &str;

    /// Whether formatting left the text unchanged.
    fn is_formatted(&self) -> bool {
        self.source() == self.formatted()
    }
}

/// A formatting / colorizing / conformance-checking engine.
pub trait AnalysisEngine {
    /// Output of the formatting stage, input of the later stages.
    type Formatted: FormattedBuffer;

    /// Colorize `text` into the surface.
    fn colorize(
        &mut self,
        text: &str,
        surface: &mut dyn EditorSurface,
        config: &AnalysisConfig,
    ) -> Result<(), AnalysisError>;

    /// Format `text`.
    fn format(
        &mut self,
        text: &str,
        surface: &mut dyn EditorSurface,
        config: &AnalysisConfig,
    ) -> Result<Self::Formatted, AnalysisError>;

    /// Colorize the surface from an already formatted buffer.
    fn colorize_formatted(
        &mut self,
        formatted: &Self::Formatted,
        surface: &mut dyn EditorSurface,
        config: &AnalysisConfig,
    ) -> Result<(), AnalysisError>;

    /// Run the conformance rules. The returned order is preserved by every caller.
    fn check_conformance(
        &mut self,
        formatted: &Self::Formatted,
        conformance: &ConformanceConfig,
    ) -> Result<Vec<Diagnostic>, AnalysisError>;
}

/// Colorize the current buffer.
pub fn colorize<E>(
    engine: &mut E,
    surface: &mut dyn EditorSurface,
    config: &AnalysisConfig,
) -> Result<(), AnalysisError>
where
    E: AnalysisEngine + ?Sized,
{
    let text = surface.text();
    engine.colorize(&text, surface, config)
}

/// Format, colorize and conformance-check the current buffer.
///
/// Every diagnostic is stamped with `file_identity` when one is given.
pub fn check_conformance<E>(
    engine: &mut E,
    surface: &mut dyn EditorSurface,
    config: &AnalysisConfig,
    file_identity: Option<&str>,
) -> Result<Vec<Diagnostic>, AnalysisError>
where
    E: AnalysisEngine + ?Sized,
{
    config.conformance.validate()?;
    let text = surface.text();
    let formatted = engine.format(&text, surface, config)?;
    if config.colorize_on_check {
        engine.colorize_formatted(&formatted, surface, config)?;
    }
    let diagnostics = engine.check_conformance(&formatted, &config.conformance)?;

    Ok(match file_identity {
        Some(file) => diagnostics
            .into_iter()
            .map(|diag| diag.with_file(file))
            .collect(),
        None => diagnostics,
    })
}

/// Check whether the current buffer is already in formatted form.
pub fn check_formatted<E>(
    engine: &mut E,
    surface: &mut dyn EditorSurface,
    config: &AnalysisConfig,
) -> Result<bool, AnalysisError>
where
    E: AnalysisEngine + ?Sized,
{
    let text = surface.text();
    let formatted = engine.format(&text, surface, config)?;
    Ok(formatted.formatted() == text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DiagnosticRange, HeadlessSurface};
    use pretty_assertions::assert_eq;

    struct Formatted {
        source: String,
        formatted: String,
    }

    impl FormattedBuffer for Formatted {
        fn source(&self) -> &str {
            &self.source
        }

        fn formatted(&self) -> &str {
            &self.formatted
        }
    }

    /// Uppercases on format; records which stages ran.
    #[derive(Default)]
    struct StageEngine {
        fail_format: bool,
        fail_colorize: bool,
        stages: Vec<&'static str>,
    }

    impl AnalysisEngine for StageEngine {
        type Formatted = Formatted;

        fn colorize(
            &mut self,
            _text: &str,
            _surface: &mut dyn EditorSurface,
            _config: &AnalysisConfig,
        ) -> Result<(), AnalysisError> {
            self.stages.push("colorize");
            Ok(())
        }

        fn format(
            &mut self,
            text: &str,
            _surface: &mut dyn EditorSurface,
            _config: &AnalysisConfig,
        ) -> Result<Formatted, AnalysisError> {
            self.stages.push("format");
            if self.fail_format {
                return Err(AnalysisError::analysis("syntax error"));
            }
            Ok(Formatted {
                source: text.to_string(),
                formatted: text.to_uppercase(),
            })
        }

        fn colorize_formatted(
            &mut self,
            _formatted: &Formatted,
            _surface: &mut dyn EditorSurface,
            _config: &AnalysisConfig,
        ) -> Result<(), AnalysisError> {
            self.stages.push("colorize_formatted");
            if self.fail_colorize {
                return Err(AnalysisError::analysis("colorizer crashed"));
            }
            Ok(())
        }

        fn check_conformance(
            &mut self,
            _formatted: &Formatted,
            _conformance: &ConformanceConfig,
        ) -> Result<Vec<Diagnostic>, AnalysisError> {
            self.stages.push("check_conformance");
            Ok(vec![
                Diagnostic::new(DiagnosticRange::from_start_len(7, 1), "avoid * in SELECT"),
                Diagnostic::new(DiagnosticRange::from_start_len(0, 6), "second"),
            ])
        }
    }

    #[test]
    fn test_pipeline_runs_in_order_and_stamps_file() {
        let mut engine = StageEngine::default();
        let mut surface = HeadlessSurface::new("SELECT * FROM t", 10);
        let diagnostics = check_conformance(
            &mut engine,
            &mut surface,
            &AnalysisConfig::default(),
            Some("q.sql"),
        )
        .unwrap();

        assert_eq!(
            engine.stages,
            vec!["format", "colorize_formatted", "check_conformance"]
        );
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].message, "avoid * in SELECT");
        assert_eq!(diagnostics[1].message, "second");
        assert!(diagnostics.iter().all(|d| d.file.as_deref() == Some("q.sql")));
    }

    #[test]
    fn test_format_failure_short_circuits() {
        let mut engine = StageEngine {
            fail_format: true,
            ..Default::default()
        };
        let mut surface = HeadlessSurface::new("SELEC", 10);
        let err = check_conformance(&mut engine, &mut surface, &AnalysisConfig::default(), None)
            .unwrap_err();
        assert_eq!(err, AnalysisError::analysis("syntax error"));
        assert_eq!(engine.stages, vec!["format"]);
    }

    #[test]
    fn test_colorize_failure_short_circuits() {
        let mut engine = StageEngine {
            fail_colorize: true,
            ..Default::default()
        };
        let mut surface = HeadlessSurface::new("select 1", 10);
        let err = check_conformance(&mut engine, &mut surface, &AnalysisConfig::default(), None)
            .unwrap_err();
        assert_eq!(err.to_string(), "colorizer crashed");
        assert_eq!(engine.stages, vec!["format", "colorize_formatted"]);
    }

    #[test]
    fn test_colorize_on_check_can_be_disabled() {
        let mut engine = StageEngine::default();
        let mut surface = HeadlessSurface::new("select 1", 10);
        let config = AnalysisConfig {
            colorize_on_check: false,
            ..Default::default()
        };
        check_conformance(&mut engine, &mut surface, &config, None).unwrap();
        assert_eq!(engine.stages, vec!["format", "check_conformance"]);
    }

    #[test]
    fn test_invalid_rule_settings_fail_before_format() {
        let mut engine = StageEngine::default();
        let mut surface = HeadlessSurface::new("select 1", 10);
        let mut config = AnalysisConfig::default();
        config.conformance.max_line_length = Some(0);

        let err = check_conformance(&mut engine, &mut surface, &config, None).unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration(_)));
        assert!(engine.stages.is_empty());
    }

    #[test]
    fn test_check_formatted_compares_with_buffer() {
        let mut engine = StageEngine::default();
        let config = AnalysisConfig::default();

        let mut surface = HeadlessSurface::new("SELECT 1", 10);
        assert!(check_formatted(&mut engine, &mut surface, &config).unwrap());

        let mut surface = HeadlessSurface::new("select 1", 10);
        assert!(!check_formatted(&mut engine, &mut surface, &config).unwrap());
    }
}
