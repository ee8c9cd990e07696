//! Host glue: what an editor window does around the synchronization loop.
//!
//! The host owns the loop, forwards the surface's change notifications to the loop triggers the
//! way an editor's event handlers would, and renders the notification state as text.

use crate::script::ScriptCommand;
use anyhow::{Context, Result};
use sqlcheck_core::{
    AnalysisConfig, AnalysisLoop, Diagnostic, DiagnosticRange, DiagnosticSeverity,
    EditorSurface, HeadlessSurface, LoopOutcome, NotificationState, ResetKind, SurfaceChange,
};
use sqlcheck_sql::SqlEngine;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Upper bound on drain rounds per pump.
const MAX_PUMP_ROUNDS: usize = 8;

pub type SqlLoop = AnalysisLoop<HeadlessSurface, SqlEngine>;

/// A headless editor window around one SQL document.
pub struct Host {
    analysis: SqlLoop,
    path: Option<PathBuf>,
}

impl Host {
    pub fn new(config: AnalysisConfig, viewport_height: usize) -> Result<Self> {
        let engine = SqlEngine::new().context("failed to build the SQL engine")?;
        Ok(Self {
            analysis: AnalysisLoop::new(HeadlessSurface::empty(viewport_height), engine, config),
            path: None,
        })
    }

    pub fn analysis(&self) -> &SqlLoop {
        &self.analysis
    }

    /// Open a file from disk.
    pub fn open(&mut self, path: &Path) -> Result<LoopOutcome> {
        let text = read_document(path)?;
        self.path = Some(path.to_path_buf());
        let outcome = self.analysis.load_document(
            ResetKind::Open,
            Some(path.display().to_string()),
            &text,
        );
        self.pump();
        Ok(outcome)
    }

    /// Load text that has no file behind it.
    pub fn open_text(&mut self, name: Option<String>, text: &str) -> LoopOutcome {
        self.path = None;
        let outcome = self.analysis.load_document(ResetKind::Open, name, text);
        self.pump();
        outcome
    }

    /// Apply one scripted event, then deliver the change notifications it caused.
    pub fn apply(&mut self, command: &ScriptCommand) -> Result<()> {
        debug!(command = command.name(), "apply");
        match command {
            ScriptCommand::Edit(text) => self.analysis.with_surface_mut(|s| s.replace_text(text)),
            ScriptCommand::Insert { offset, text } => {
                self.analysis.with_surface_mut(|s| s.insert(*offset, text))
            }
            ScriptCommand::Delete { start, end } => self
                .analysis
                .with_surface_mut(|s| s.delete(DiagnosticRange::new(*start, *end))),
            ScriptCommand::Check => {
                self.analysis.on_check();
            }
            ScriptCommand::Scroll(line) => self.analysis.with_surface_mut(|s| s.scroll_to_line(*line)),
            ScriptCommand::Select { start, end } => self
                .analysis
                .with_surface_mut(|s| s.select(DiagnosticRange::new(*start, *end))),
            ScriptCommand::Pick(index) => {
                if self.analysis.on_diagnostic_index_picked(*index).is_none() {
                    debug!(index, "no such problem");
                }
            }
            ScriptCommand::Reset => {
                self.path = None;
                self.analysis.load_document(ResetKind::New, None, "");
            }
            ScriptCommand::Reload => {
                let path = self
                    .path
                    .clone()
                    .context("reload: the document has no file")?;
                let text = read_document(&path)?;
                self.analysis.load_document(ResetKind::Reload, None, &text);
            }
            ScriptCommand::Resize(height) => {
                self.analysis
                    .with_surface_mut(|s| s.set_viewport_height(*height));
                self.analysis.on_resize();
            }
            ScriptCommand::IsFormatted => {
                self.analysis.on_is_formatted();
            }
            ScriptCommand::Show => {}
        }
        self.pump();
        Ok(())
    }

    /// Deliver queued surface changes to the loop.
    ///
    /// User edits become `on_buffer_changed`; scrolling and selection become
    /// `on_scroll_or_selection_changed`. Changes made under the modification lock (loads, engine
    /// rewrites) and style changes are not user edits and are not forwarded.
    pub fn pump(&self) {
        for _ in 0..MAX_PUMP_ROUNDS {
            let changes = self.analysis.with_surface_mut(|s| s.take_changes());
            if changes.is_empty() {
                return;
            }
            for change in changes {
                match change {
                    SurfaceChange::TextChanged { locked: false } => {
                        self.analysis.on_buffer_changed();
                    }
                    SurfaceChange::Scrolled { .. } | SurfaceChange::SelectionChanged => {
                        let line = self.analysis.with_surface(|s| s.first_visible_line());
                        self.analysis.on_scroll_or_selection_changed(line);
                    }
                    SurfaceChange::TextChanged { locked: true } | SurfaceChange::StylesChanged => {
                        trace!(?change, "not forwarded");
                    }
                }
            }
        }
    }

    /// Multi-line rendering of the notification state, as the problems panel would show it.
    pub fn render_notification(&self) -> String {
        let notification = self.analysis.notification();
        let marker = self.analysis.selection_marker();
        let mut out = String::new();

        match &notification {
            NotificationState::Idle => out.push_str("idle\n"),
            NotificationState::Diagnostics(entries) => {
                let summary = notification.overlay().map(|o| o.text).unwrap_or_default();
                let _ = writeln!(out, "{summary}");
                for diag in entries {
                    let picked = if marker == Some(diag.range) { '>' } else { ' ' };
                    let _ = writeln!(out, "{picked} {}", self.describe(diag));
                }
            }
            NotificationState::Error(err) => {
                let _ = writeln!(out, "error: {err}");
            }
            NotificationState::Message(text) => {
                let _ = writeln!(out, "{text}");
            }
        }
        out
    }

    /// `line:col severity[code] message` with 1-based positions.
    pub fn describe(&self, diag: &Diagnostic) -> String {
        let (line, col) = self
            .analysis
            .with_surface(|s| s.position_of_char(diag.range.start));
        let severity = severity_name(diag.severity);
        match &diag.code {
            Some(code) => format!("{}:{} {severity}[{code}] {diag}", line + 1, col + 1),
            None => format!("{}:{} {severity} {diag}", line + 1, col + 1),
        }
    }

    /// The buffer, with a line-number gutter when decorations are enabled.
    pub fn render_buffer(&self) -> String {
        let text = self.analysis.with_surface(|s| s.text());
        if !self.analysis.config().host.decorations_enabled() {
            return text;
        }
        let mut out = String::new();
        for (i, line) in text.split('\n').enumerate() {
            let _ = writeln!(out, "{:>4} | {line}", i + 1);
        }
        out
    }
}

pub fn severity_name(severity: Option<DiagnosticSeverity>) -> &'static str {
    match severity {
        Some(DiagnosticSeverity::Error) => "error",
        Some(DiagnosticSeverity::Warning) => "warning",
        Some(DiagnosticSeverity::Information) => "info",
        Some(DiagnosticSeverity::Hint) => "hint",
        None => "note",
    }
}

fn read_document(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn host(text: &str) -> Host {
        let mut host = Host::new(AnalysisConfig::default(), 10).unwrap();
        host.open_text(None, text);
        host
    }

    #[test]
    fn test_load_is_not_forwarded_as_edit() {
        let host = host("select 1");
        // The locked load produced no analysis and nothing to show.
        assert_eq!(host.analysis().notification(), NotificationState::Idle);
        assert!(host.analysis().with_surface(|s| s.styles().is_empty()));
    }

    #[test]
    fn test_user_edit_colorizes() {
        let mut host = host("SELECT 1");
        host.apply(&ScriptCommand::Insert {
            offset: 8,
            text: " FROM t".to_string(),
        })
        .unwrap();
        assert!(!host.analysis().with_surface(|s| s.styles().is_empty()));
        assert_eq!(host.analysis().notification(), NotificationState::Idle);
    }

    #[test]
    fn test_check_and_pick_render() {
        let mut host = host("SELECT * FROM t");
        host.apply(&ScriptCommand::Check).unwrap();
        assert_eq!(
            host.render_notification(),
            "1 non-conformance\n  1:8 warning[select-star] avoid * in SELECT\n"
        );

        host.apply(&ScriptCommand::Pick(0)).unwrap();
        assert_eq!(
            host.render_notification(),
            "1 non-conformance\n> 1:8 warning[select-star] avoid * in SELECT\n"
        );
        assert_eq!(
            host.analysis().with_surface(|s| s.selection()),
            DiagnosticRange::new(7, 8)
        );
    }

    #[test]
    fn test_failure_renders_error() {
        let mut host = host("SELECT * FROM t");
        host.apply(&ScriptCommand::Edit("syntax error".to_string()))
            .unwrap();
        host.apply(&ScriptCommand::Check).unwrap();
        assert!(host.render_notification().starts_with("error: invalid SQL syntax"));
    }

    #[test]
    fn test_scroll_is_forwarded() {
        let text = (0..50)
            .map(|i| format!("SELECT {i};"))
            .collect::<Vec<_>>()
            .join("\n");
        let mut host = host(&text);
        host.apply(&ScriptCommand::Scroll(30)).unwrap();
        assert_eq!(host.analysis().last_analyzed_first_visible_line(), 30);

        host.apply(&ScriptCommand::Resize(5)).unwrap();
        assert_eq!(host.analysis().last_analyzed_first_visible_line(), 30);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut host = host("SELECT * FROM t");
        host.apply(&ScriptCommand::Check).unwrap();
        host.apply(&ScriptCommand::Reset).unwrap();
        assert_eq!(host.render_notification(), "idle\n");
        assert_eq!(host.analysis().with_surface(|s| s.text()), "");
    }

    #[test]
    fn test_reload_without_file_fails() {
        let mut host = host("SELECT 1");
        assert!(host.apply(&ScriptCommand::Reload).is_err());
    }

    #[test]
    fn test_render_buffer_gutter() {
        let host = host("SELECT 1\nFROM t");
        assert_eq!(host.render_buffer(), "   1 | SELECT 1\n   2 | FROM t\n");
    }
}
