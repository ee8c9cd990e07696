//! Shared test doubles for the synchronization loop tests.

#![allow(dead_code)]

use sqlcheck_core::{
    AnalysisConfig, AnalysisEngine, AnalysisError, AnalysisLoop, ConformanceConfig, Diagnostic,
    DiagnosticRange, EditorSurface, FormattedBuffer, HeadlessSurface, StyleSpan,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub type TestLoop = AnalysisLoop<HeadlessSurface, ScriptedEngine>;

/// What the engine does, and what it saw. Shared between the test and the engine.
#[derive(Default)]
pub struct EngineRecorder {
    pub colorize_calls: Cell<usize>,
    pub format_calls: Cell<usize>,
    pub check_calls: Cell<usize>,
    /// Failure returned by the next colorize calls.
    pub colorize_failure: RefCell<Option<AnalysisError>>,
    /// Failure returned by the format stage.
    pub format_failure: RefCell<Option<AnalysisError>>,
    /// Diagnostics returned by the conformance stage.
    pub diagnostics: RefCell<Vec<Diagnostic>>,
    /// Upper-case the buffer on format when set.
    pub uppercase_on_format: Cell<bool>,
    /// Run from inside `colorize`, before it returns.
    pub during_colorize: RefCell<Option<Box<dyn Fn()>>>,
    /// Run from inside `format`, before it returns.
    pub during_format: RefCell<Option<Box<dyn Fn()>>>,
}

impl EngineRecorder {
    pub fn fail_colorize(&self, message: &str) {
        *self.colorize_failure.borrow_mut() = Some(AnalysisError::analysis(message));
    }

    pub fn succeed_colorize(&self) {
        *self.colorize_failure.borrow_mut() = None;
    }

    pub fn fail_format(&self, message: &str) {
        *self.format_failure.borrow_mut() = Some(AnalysisError::analysis(message));
    }

    pub fn set_diagnostics(&self, diagnostics: Vec<Diagnostic>) {
        *self.diagnostics.borrow_mut() = diagnostics;
    }

    pub fn set_during_colorize(&self, hook: impl Fn() + 'static) {
        *self.during_colorize.borrow_mut() = Some(Box::new(hook));
    }

    pub fn set_during_format(&self, hook: impl Fn() + 'static) {
        *self.during_format.borrow_mut() = Some(Box::new(hook));
    }

    pub fn total_invocations(&self) -> usize {
        self.colorize_calls.get() + self.check_calls.get()
    }
}

pub struct Formatted {
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

/// Engine whose behaviour is scripted through an [`EngineRecorder`].
pub struct ScriptedEngine {
    recorder: Rc<EngineRecorder>,
}

impl ScriptedEngine {
    pub fn new(recorder: Rc<EngineRecorder>) -> Self {
        Self { recorder }
    }
}

impl AnalysisEngine for ScriptedEngine {
    type Formatted = Formatted;

    fn colorize(
        &mut self,
        text: &str,
        surface: &mut dyn EditorSurface,
        _config: &AnalysisConfig,
    ) -> Result<(), AnalysisError> {
        let recorder = &self.recorder;
        recorder.colorize_calls.set(recorder.colorize_calls.get() + 1);
        surface.replace_styles(vec![StyleSpan::new(0, text.chars().count(), 1)]);
        if let Some(hook) = recorder.during_colorize.borrow().as_ref() {
            hook();
        }
        match recorder.colorize_failure.borrow().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn format(
        &mut self,
        text: &str,
        _surface: &mut dyn EditorSurface,
        _config: &AnalysisConfig,
    ) -> Result<Formatted, AnalysisError> {
        let recorder = &self.recorder;
        recorder.format_calls.set(recorder.format_calls.get() + 1);
        if let Some(hook) = recorder.during_format.borrow().as_ref() {
            hook();
        }
        if let Some(err) = recorder.format_failure.borrow().clone() {
            return Err(err);
        }
        let formatted = if recorder.uppercase_on_format.get() {
            text.to_uppercase()
        } else {
            text.to_string()
        };
        Ok(Formatted {
            source: text.to_string(),
            formatted,
        })
    }

    fn colorize_formatted(
        &mut self,
        formatted: &Formatted,
        surface: &mut dyn EditorSurface,
        _config: &AnalysisConfig,
    ) -> Result<(), AnalysisError> {
        surface.replace_styles(vec![StyleSpan::new(0, formatted.source.chars().count(), 1)]);
        Ok(())
    }

    fn check_conformance(
        &mut self,
        _formatted: &Formatted,
        _conformance: &ConformanceConfig,
    ) -> Result<Vec<Diagnostic>, AnalysisError> {
        let recorder = &self.recorder;
        recorder.check_calls.set(recorder.check_calls.get() + 1);
        Ok(recorder.diagnostics.borrow().clone())
    }
}

/// Build a loop over a headless surface showing 10 lines.
pub fn test_loop(text: &str) -> (Rc<TestLoop>, Rc<EngineRecorder>) {
    let recorder = Rc::new(EngineRecorder::default());
    let analysis = AnalysisLoop::new(
        HeadlessSurface::new(text, 10),
        ScriptedEngine::new(Rc::clone(&recorder)),
        AnalysisConfig::default(),
    );
    (Rc::new(analysis), recorder)
}

pub fn diag(start: usize, len: usize, message: &str) -> Diagnostic {
    Diagnostic::new(DiagnosticRange::from_start_len(start, len), message)
}

/// `count` short lines, `SELECT 0;` .. `SELECT {count-1};`.
pub fn numbered_lines(count: usize) -> String {
    (0..count)
        .map(|i| format!("SELECT {i};"))
        .collect::<Vec<_>>()
        .join("\n")
}
